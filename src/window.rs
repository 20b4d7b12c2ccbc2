//! Row windowing.
//!
//! Only rows intersecting the viewport, plus a fixed overscan on each side,
//! are materialized. Rows have one fixed height, so the row at `index` sits at
//! `index * row_height` inside a content area of `count * row_height`.

use std::ops::Range;

use tracing::trace;

use crate::domain::RosterError;

/// Read access to a scrollable area.
pub trait ScrollSurface {
    fn scroll_offset(&self) -> u32;
    fn viewport_height(&self) -> u32;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_offset: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(scroll_offset: u32, height: u32) -> Self {
        Self {
            scroll_offset,
            height,
        }
    }
}

impl ScrollSurface for Viewport {
    fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    fn viewport_height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualRow {
    pub index: usize,
    pub offset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleWindow {
    /// Rows that intersect the viewport.
    pub visible: Range<usize>,
    /// Rows to render, `visible` widened by the overscan.
    pub rows: Vec<VirtualRow>,
    pub total_height: u64,
}

impl VisibleWindow {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindowing {
    row_height: u32,
    overscan: usize,
}

impl RowWindowing {
    pub fn new(row_height: u32, overscan: usize) -> Result<Self, RosterError> {
        if row_height == 0 {
            return Err(RosterError::Config(
                "estimated row height must be positive".into(),
            ));
        }
        Ok(Self {
            row_height,
            overscan,
        })
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn offset_of(&self, index: usize) -> u64 {
        index as u64 * self.row_height as u64
    }

    pub fn total_height(&self, count: usize) -> u64 {
        self.offset_of(count)
    }

    /// Number of rows needed to cover a viewport of `viewport_height`.
    pub fn rows_per_viewport(&self, viewport_height: u32) -> usize {
        viewport_height.div_ceil(self.row_height) as usize
    }

    /// Upper bound of `window(..).len()` for a viewport, independent of the row count.
    pub fn max_rendered(&self, viewport_height: u32) -> usize {
        if viewport_height == 0 {
            return 0;
        }
        self.rows_per_viewport(viewport_height) + 2 * self.overscan
    }

    pub fn max_scroll(&self, count: usize, viewport_height: u32) -> u32 {
        let max = self
            .total_height(count)
            .saturating_sub(viewport_height as u64);
        u32::try_from(max).unwrap_or(u32::MAX)
    }

    /// The visible range covers `ceil(viewport / row_height)` rows from the first
    /// intersecting one. When the offset is not a multiple of the row height the
    /// partly visible row below that range only appears through the overscan.
    pub fn window(&self, count: usize, surface: &impl ScrollSurface) -> VisibleWindow {
        let total_height = self.total_height(count);
        let viewport_height = surface.viewport_height();
        if viewport_height == 0 || count == 0 {
            return VisibleWindow {
                visible: 0..0,
                rows: Vec::new(),
                total_height,
            };
        }

        let first = (surface.scroll_offset() / self.row_height) as usize;
        let visible_end = first
            .saturating_add(self.rows_per_viewport(viewport_height))
            .min(count);
        let visible = first.min(count)..visible_end;

        let start = first.saturating_sub(self.overscan).min(count);
        let end = visible_end.saturating_add(self.overscan).min(count);

        let rows = (start..end)
            .map(|index| VirtualRow {
                index,
                offset: self.offset_of(index),
            })
            .collect::<Vec<_>>();

        trace!(
            "Window: offset {}, viewport {}, visible {:?}, rendered {}..{}",
            surface.scroll_offset(),
            viewport_height,
            visible,
            start,
            end
        );

        VisibleWindow {
            visible,
            rows,
            total_height,
        }
    }

    /// Smallest scroll change that brings the row at `index` fully into view.
    pub fn scroll_to_reveal(&self, index: usize, surface: &impl ScrollSurface) -> u32 {
        let current = surface.scroll_offset() as u64;
        let viewport = surface.viewport_height() as u64;
        let top = self.offset_of(index);
        let bottom = top + self.row_height as u64;

        let offset = if top < current {
            top
        } else if bottom > current + viewport {
            bottom.saturating_sub(viewport)
        } else {
            current
        };
        u32::try_from(offset).unwrap_or(u32::MAX)
    }
}
