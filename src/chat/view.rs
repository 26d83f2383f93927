use crate::deepseek::Render;

/// The surface a chat turn is displayed on. On top of rendering the
/// streamed reply it has to show that a request is in flight and
/// report errors to the user.
pub trait ChatView: Render {
    /// A request was sent and the reply has not started yet.
    fn busy(&mut self, label: &str);

    fn error(&mut self, message: &str);
}
