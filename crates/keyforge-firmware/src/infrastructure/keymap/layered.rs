//! A stack of keymap layers with shift and lock activation.
//!
//! Layer 0 is the base layer and is always active.  Any other layer is active
//! while at least one of its shift keys is held, or while it is locked.
//! Lookup walks the active layers from the highest index down and returns
//! the first key that is not [`Key::Transparent`].

use keyforge_core::{ActiveKeys, Key, KeyAddr, KeyEvent, KeyParseError, LayerId, LayerKey};
use thiserror::Error;
use tracing::debug;

use crate::application::controller::Keymap;

/// Error type for keymap construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("keymap has no layers")]
    Empty,
    #[error("layer {layer} has {found} keys, expected {expected}")]
    LayerSize {
        layer: usize,
        expected: usize,
        found: usize,
    },
    #[error("key {addr} on layer {layer} refers to missing layer {target}")]
    UnknownLayer {
        layer: usize,
        addr: KeyAddr,
        target: LayerId,
    },
    #[error("layer {layer}, key {index}: {source}")]
    Parse {
        layer: usize,
        index: usize,
        #[source]
        source: KeyParseError,
    },
}

/// Layered keymap with per-layer shift counts and lock flags.
#[derive(Debug, Clone)]
pub struct LayeredKeymap {
    layers: Vec<Vec<Key>>,
    shift_counts: Vec<u8>,
    locked: Vec<bool>,
}

impl LayeredKeymap {
    /// Builds a keymap from fully resolved layers.
    ///
    /// Every layer must have the same number of keys as the base layer, and
    /// every layer key must refer to an existing layer.
    pub fn new(layers: Vec<Vec<Key>>) -> Result<Self, KeymapError> {
        let expected = match layers.first() {
            Some(base) if !base.is_empty() => base.len(),
            _ => return Err(KeymapError::Empty),
        };
        for (layer, keys) in layers.iter().enumerate() {
            if keys.len() != expected {
                return Err(KeymapError::LayerSize {
                    layer,
                    expected,
                    found: keys.len(),
                });
            }
            for (idx, key) in keys.iter().enumerate() {
                if let Some(layer_key) = key.as_layer() {
                    if usize::from(layer_key.layer()) >= layers.len() {
                        return Err(KeymapError::UnknownLayer {
                            layer,
                            addr: KeyAddr(idx as u16),
                            target: layer_key.layer(),
                        });
                    }
                }
            }
        }
        let count = layers.len();
        Ok(Self {
            layers,
            shift_counts: vec![0; count],
            locked: vec![false; count],
        })
    }

    /// Builds a keymap from key names, one list per layer.
    pub fn from_names<S: AsRef<str>>(layers: &[Vec<S>]) -> Result<Self, KeymapError> {
        let parsed = layers
            .iter()
            .enumerate()
            .map(|(layer, names)| {
                names
                    .iter()
                    .enumerate()
                    .map(|(index, name)| {
                        name.as_ref()
                            .parse::<Key>()
                            .map_err(|source| KeymapError::Parse {
                                layer,
                                index,
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Keys per layer.
    pub fn key_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    pub fn is_layer_active(&self, layer: LayerId) -> bool {
        let idx = usize::from(layer);
        idx == 0
            || self.shift_counts.get(idx).is_some_and(|&n| n > 0)
            || self.locked.get(idx).copied().unwrap_or(false)
    }

    /// Active layers, highest first.
    pub fn active_layers(&self) -> Vec<LayerId> {
        (0..self.layers.len())
            .rev()
            .map(|idx| idx as LayerId)
            .filter(|&layer| self.is_layer_active(layer))
            .collect()
    }

    /// Deactivates every layer except the base layer.
    pub fn reset_layers(&mut self) {
        self.shift_counts.fill(0);
        self.locked.fill(false);
    }
}

impl Keymap for LayeredKeymap {
    fn lookup(&self, addr: KeyAddr) -> Key {
        self.active_layers()
            .into_iter()
            .filter_map(|layer| self.layers[usize::from(layer)].get(addr.index()).copied())
            .find(|key| !key.is_transparent())
            .unwrap_or(Key::Blank)
    }

    fn handle_layer_change(&mut self, event: &KeyEvent, _active_keys: &mut ActiveKeys) {
        let Some(layer_key) = event.key.as_layer() else {
            return;
        };
        let idx = usize::from(layer_key.layer());
        if idx == 0 || idx >= self.layers.len() {
            return;
        }
        match layer_key {
            LayerKey::Shift(layer) => {
                if event.state.toggled_on() {
                    self.shift_counts[idx] = self.shift_counts[idx].saturating_add(1);
                } else if event.state.toggled_off() {
                    self.shift_counts[idx] = self.shift_counts[idx].saturating_sub(1);
                }
                debug!("layer {layer} shift count now {}", self.shift_counts[idx]);
            }
            LayerKey::Lock(layer) => {
                if event.state.toggled_on() {
                    self.locked[idx] = !self.locked[idx];
                    debug!("layer {layer} lock now {}", self.locked[idx]);
                }
            }
        }
    }
}
