//! Message handler seam between the worker pool and the outside world.

use dispatch_models::ActionMessage;

use crate::error::HandlerError;

/// Carries out one dequeued action.
///
/// Implementations talk to the database or message bus. A returned error is
/// logged and counted; the worker moves on to the next message, and any
/// retry policy belongs to the implementation.
pub trait MessageHandler: Send + Sync {
    /// Handles one message.
    fn handle(&self, message: &ActionMessage) -> Result<(), HandlerError>;
}

impl<F> MessageHandler for F
where
    F: Fn(&ActionMessage) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, message: &ActionMessage) -> Result<(), HandlerError> {
        self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_models::ActionKind;

    #[test]
    fn test_closure_handler() {
        let handler = |msg: &ActionMessage| match msg.kind {
            ActionKind::Notification => Ok(()),
            other => Err(HandlerError::Unsupported(other)),
        };

        let ok = ActionMessage::new("t1", ActionKind::Notification);
        let unsupported = ActionMessage::new("t1", ActionKind::GenerateTests);

        assert!(handler.handle(&ok).is_ok());
        assert!(matches!(
            handler.handle(&unsupported),
            Err(HandlerError::Unsupported(ActionKind::GenerateTests))
        ));
    }
}
