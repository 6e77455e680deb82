//! The color table shared by every layer and brush of a drawing.
//!
//! Indexed surfaces store one byte per pixel; the palette maps those bytes
//! to RGBA.  A packed 32-bit table is kept in lock-step with the entry
//! table so the indexed-to-RGBA expansion path never re-packs per pixel.

use crate::error::PaletteError;
use crate::event::{EditorEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// One palette entry: `[r, g, b, a]`.
pub type Rgba8 = [u8; 4];

/// Maximum number of entries (one byte of index space).
pub const MAX_COLORS: usize = 256;

/// Shared handle to the single palette of a drawing.  Dependents hold a
/// clone of the handle, never a copy of the table, so a palette edit is
/// immediately visible to all of them.
pub type PaletteRef = Rc<RefCell<Palette>>;

/// Partial per-channel color update; `None` leaves the channel untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorUpdate {
    pub r: Option<u8>,
    pub g: Option<u8>,
    pub b: Option<u8>,
    pub a: Option<u8>,
}

impl ColorUpdate {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: Some(r),
            g: Some(g),
            b: Some(b),
            a: None,
        }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: Some(r),
            g: Some(g),
            b: Some(b),
            a: Some(a),
        }
    }

    pub fn alpha(a: u8) -> Self {
        Self {
            a: Some(a),
            ..Self::default()
        }
    }

    fn apply(self, mut color: Rgba8) -> Rgba8 {
        if let Some(r) = self.r {
            color[0] = r;
        }
        if let Some(g) = self.g {
            color[1] = g;
        }
        if let Some(b) = self.b {
            color[2] = b;
        }
        if let Some(a) = self.a {
            color[3] = a;
        }
        color
    }
}

/// Serializable palette snapshot for the host's save path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSpec {
    pub colors: Vec<Rgba8>,
    pub foreground: u8,
    pub background: u8,
}

pub struct Palette {
    colors: Vec<Rgba8>,
    /// Packed `A<<24 | B<<16 | G<<8 | R` mirror of `colors`, always
    /// recomputed before any mutation returns.
    colors32: [u32; MAX_COLORS],
    foreground: u8,
    background: u8,
    /// Gradient fill index range, when one is selected.
    range: Option<(u8, u8)>,
    events: EventBus,
}

#[inline]
fn pack(color: Rgba8) -> u32 {
    ((color[3] as u32) << 24) | ((color[2] as u32) << 16) | ((color[1] as u32) << 8) | color[0] as u32
}

/// Unpack a packed entry back into `[r, g, b, a]` bytes.
#[inline]
pub fn unpack(packed: u32) -> Rgba8 {
    [
        (packed & 0xff) as u8,
        ((packed >> 8) & 0xff) as u8,
        ((packed >> 16) & 0xff) as u8,
        ((packed >> 24) & 0xff) as u8,
    ]
}

impl Palette {
    /// Build a palette from up to [`MAX_COLORS`] entries.  Indices listed
    /// in `transparent` get their alpha forced to zero.
    pub fn new(mut colors: Vec<Rgba8>, transparent: &[usize], events: EventBus) -> Self {
        colors.truncate(MAX_COLORS);
        if colors.is_empty() {
            colors = vec![[0, 0, 0, 0], [0, 0, 0, 255]];
        }
        for &index in transparent {
            if let Some(color) = colors.get_mut(index) {
                color[3] = 0;
            }
        }
        let mut palette = Self {
            colors,
            colors32: [0; MAX_COLORS],
            foreground: 1,
            background: 0,
            range: None,
            events,
        };
        palette.repack_all();
        palette
    }

    pub fn shared(self) -> PaletteRef {
        Rc::new(RefCell::new(self))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entry lookup; out-of-range reads yield transparent black, matching
    /// the clamp-never-panic rule for reads.
    pub fn rgba(&self, index: usize) -> Rgba8 {
        self.colors.get(index).copied().unwrap_or([0, 0, 0, 0])
    }

    #[inline]
    pub fn packed(&self, index: usize) -> u32 {
        if index < MAX_COLORS {
            self.colors32[index]
        } else {
            0
        }
    }

    pub fn packed_table(&self) -> &[u32; MAX_COLORS] {
        &self.colors32
    }

    pub fn foreground(&self) -> u8 {
        self.foreground
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn range(&self) -> Option<(u8, u8)> {
        self.range
    }

    /// Find the entry equal to `color`, if any.  Used by the picker on
    /// direct-color surfaces.
    pub fn find(&self, color: Rgba8) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    fn check_index(&self, index: usize) -> Result<(), PaletteError> {
        if index < self.colors.len() {
            Ok(())
        } else {
            Err(PaletteError::IndexOutOfRange {
                index,
                len: self.colors.len(),
            })
        }
    }

    /// Update one entry, channel by channel.  Returns the resolved color.
    /// Emits a `PaletteColorChanged` notification unless `silent`.
    pub fn change_color(
        &mut self,
        index: usize,
        update: ColorUpdate,
        silent: bool,
    ) -> Result<Rgba8, PaletteError> {
        self.check_index(index)?;
        let resolved = update.apply(self.colors[index]);
        self.colors[index] = resolved;
        self.colors32[index] = pack(resolved);
        if !silent {
            self.events
                .emit(&EditorEvent::PaletteColorChanged { index, rgba: resolved });
        }
        Ok(resolved)
    }

    /// Replace the whole table atomically and emit one table-wide
    /// notification.
    pub fn set_colors(&mut self, mut colors: Vec<Rgba8>) {
        colors.truncate(MAX_COLORS);
        self.colors = colors;
        self.repack_all();
        self.events.emit(&EditorEvent::PaletteReplaced);
    }

    pub fn set_foreground(&mut self, index: u8) -> Result<(), PaletteError> {
        self.check_index(index as usize)?;
        self.foreground = index;
        self.events.emit(&EditorEvent::ForegroundChanged(index));
        Ok(())
    }

    pub fn set_background(&mut self, index: u8) -> Result<(), PaletteError> {
        self.check_index(index as usize)?;
        self.background = index;
        self.events.emit(&EditorEvent::BackgroundChanged(index));
        Ok(())
    }

    /// Select the index range the gradient fill maps through.
    pub fn set_range(&mut self, from: u8, to: u8) -> Result<(), PaletteError> {
        self.check_index(from as usize)?;
        self.check_index(to as usize)?;
        self.range = Some((from, to));
        self.events.emit(&EditorEvent::RangeChanged { from, to });
        Ok(())
    }

    pub fn clear_range(&mut self) {
        self.range = None;
    }

    fn repack_all(&mut self) {
        self.colors32 = [0; MAX_COLORS];
        for (index, &color) in self.colors.iter().enumerate() {
            self.colors32[index] = pack(color);
        }
    }

    pub fn to_spec(&self) -> PaletteSpec {
        PaletteSpec {
            colors: self.colors.clone(),
            foreground: self.foreground,
            background: self.background,
        }
    }

    pub fn from_spec(spec: PaletteSpec, events: EventBus) -> Self {
        let mut palette = Self::new(spec.colors, &[], events);
        palette.foreground = spec.foreground;
        palette.background = spec.background;
        palette
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Palette")
            .field("colors", &self.colors.len())
            .field("foreground", &self.foreground)
            .field("background", &self.background)
            .finish()
    }
}
