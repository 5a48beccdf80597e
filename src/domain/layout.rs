// Page layout - where each panel lands in the document

/// Vertical half of a page holding one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Top,
    Bottom,
}

/// Placement of the panel at a zero-based position in dashboard order.
///
/// Page 0 is the cover, so panel pages start at 1. Two panels share a page:
/// even indices take the top band and open a new page, odd indices take the
/// bottom band and close it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSlot {
    pub index: usize,
    pub band: Band,
    pub page: usize,
}

impl LayoutSlot {
    pub fn for_index(index: usize) -> Self {
        let band = if index % 2 == 0 { Band::Top } else { Band::Bottom };
        Self {
            index,
            band,
            page: 1 + index / 2,
        }
    }

    pub fn starts_page(&self) -> bool {
        self.band == Band::Top
    }
}

/// Total pages for a dashboard with `panel_count` panels, cover included.
pub fn page_count(panel_count: usize) -> usize {
    1 + panel_count.div_ceil(2)
}
