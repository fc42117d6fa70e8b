use crate::ids::ElementId;

/// Narrow view of group membership.
pub trait GroupManager {
    /// The id of the group `element_id` belongs to, if any.
    fn group_for(&self, element_id: &ElementId) -> Option<String>;

    /// Whether `element_id` is itself a group element.
    fn is_group(&self, element_id: &ElementId) -> bool;

    fn reset(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoGroups;

impl GroupManager for NoGroups {
    fn group_for(&self, _element_id: &ElementId) -> Option<String> {
        None
    }

    fn is_group(&self, _element_id: &ElementId) -> bool {
        false
    }
}
