//! Dense resource table owned by one environment.

use des_core::{DesError, DesResult, ResourceId};

use crate::Resource;

/// All resources of one run, indexed by [`ResourceId`].
///
/// IDs are handed out in creation order starting at `ResourceId(0)`;
/// resources are never removed.
#[derive(Clone, Debug, Default)]
pub struct ResourcePool {
    resources: Vec<Resource>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resource with `capacity` slots and return its ID.
    pub fn add(&mut self, capacity: usize) -> DesResult<ResourceId> {
        let id = ResourceId::try_from(self.resources.len())
            .map_err(|_| DesError::Config("too many resources".into()))?;
        self.resources.push(Resource::new(id, capacity)?);
        Ok(id)
    }

    pub fn get(&self, id: ResourceId) -> DesResult<&Resource> {
        self.resources
            .get(id.index())
            .ok_or(DesError::UnknownResource(id))
    }

    pub fn get_mut(&mut self, id: ResourceId) -> DesResult<&mut Resource> {
        self.resources
            .get_mut(id.index())
            .ok_or(DesError::UnknownResource(id))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.resources.iter_mut()
    }
}
