use crate::keys::ElementKey;
use crate::style::Position;

/// Why the driver declined to animate an element.
///
/// None of these are surfaced to the embedding page: the controller logs
/// them and leaves the element where layout put it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("element has no key")]
    Untracked,
    #[error("element {0} has no live layout")]
    Detached(ElementKey),
    #[error("no recorded geometry for element {0}")]
    MissingGeometry(ElementKey),
    #[error("element {key} is `position: {position}`, offsets would not be in flow")]
    UnsupportedPosition { key: ElementKey, position: Position },
    #[error("element {0} did not move")]
    Unmoved(ElementKey),
    #[error("element {0} is already snapped to the same offset")]
    AlreadySnapped(ElementKey),
    #[error("element {0} is settling")]
    Settling(ElementKey),
}
