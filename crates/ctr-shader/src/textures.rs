use std::collections::BTreeMap;

use crate::error::TextureUnitsExhausted;
use crate::types::{TextureHandle, UniformLocation};

/// Unit 0 belongs to the current-texture sampler; table entries start above it.
pub(crate) const CURRENT_TEXTURE_UNIT: u32 = 0;

/// Sampler location → texture, committed to texture units at bind time.
#[derive(Debug, Default)]
pub(crate) struct TextureBindings {
    entries: BTreeMap<UniformLocation, TextureHandle>,
}

impl TextureBindings {
    /// Records `texture` for `location`.
    ///
    /// Replacing an existing location always succeeds. A new location needs a
    /// free unit besides the reserved current-texture unit, so the table holds
    /// at most `max_units - 1` entries; `max_units` is only queried then.
    pub fn set<F>(
        &mut self,
        location: UniformLocation,
        texture: TextureHandle,
        max_units: F,
    ) -> Result<(), TextureUnitsExhausted>
    where
        F: FnOnce() -> u32,
    {
        if let Some(slot) = self.entries.get_mut(&location) {
            *slot = texture;
            return Ok(());
        }

        let max_units = max_units();
        if self.entries.len() + 1 >= max_units as usize {
            return Err(TextureUnitsExhausted { max_units });
        }

        self.entries.insert(location, texture);
        Ok(())
    }

    /// Entries paired with the unit each one is committed to, ordered by location.
    pub fn units(&self) -> impl Iterator<Item = (u32, UniformLocation, TextureHandle)> + '_ {
        self.entries
            .iter()
            .zip(CURRENT_TEXTURE_UNIT + 1..)
            .map(|((location, texture), unit)| (unit, *location, *texture))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
