use serde::{Deserialize, Serialize};
use tracing::debug;

/// Viewports narrower than this use the single-panel mobile layout.
pub const DEFAULT_MOBILE_BREAKPOINT_PX: u32 = 1_024;

/// Panel arrangement of the front end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PanelLayout {
    /// Wide viewport: sidebar, thread and info side by side.
    Desktop,
    /// Narrow viewport showing the chat list.
    MobileList,
    /// Narrow viewport showing the open thread.
    MobileThread,
}

/// Which panels are rendered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VisiblePanels {
    pub sidebar: bool,
    pub thread: bool,
    pub info: bool,
}

/// Selection plus panel layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    layout: PanelLayout,
    selected_chat_id: Option<String>,
    breakpoint_px: u32,
}

impl ViewState {
    /// Initial state for a viewport of `width_px` with an optional preselected chat.
    pub fn new(width_px: u32, breakpoint_px: u32, selected_chat_id: Option<String>) -> Self {
        let layout = if width_px < breakpoint_px {
            mobile_layout_for(selected_chat_id.is_some())
        } else {
            PanelLayout::Desktop
        };
        Self {
            layout,
            selected_chat_id,
            breakpoint_px,
        }
    }

    pub fn layout(&self) -> PanelLayout {
        self.layout
    }

    pub fn is_mobile(&self) -> bool {
        self.layout != PanelLayout::Desktop
    }

    pub fn selected_chat_id(&self) -> Option<&str> {
        self.selected_chat_id.as_deref()
    }

    pub fn breakpoint_px(&self) -> u32 {
        self.breakpoint_px
    }

    /// React to a viewport width change. Only crossing the breakpoint changes the layout.
    pub fn resize(&mut self, width_px: u32) {
        let mobile = width_px < self.breakpoint_px;
        let next = match (self.is_mobile(), mobile) {
            (false, true) => mobile_layout_for(self.selected_chat_id.is_some()),
            (true, false) => PanelLayout::Desktop,
            _ => return,
        };
        debug!(width_px, from = ?self.layout, to = ?next, "layout changed on resize");
        self.layout = next;
    }

    /// Open a chat; on mobile this reveals the thread.
    pub fn select_chat(&mut self, chat_id: impl Into<String>) {
        self.selected_chat_id = Some(chat_id.into());
        if self.layout == PanelLayout::MobileList {
            self.layout = PanelLayout::MobileThread;
        }
    }

    /// Mobile back navigation. The selection is kept.
    pub fn back(&mut self) {
        if self.layout == PanelLayout::MobileThread {
            self.layout = PanelLayout::MobileList;
        }
    }

    /// Drop the selection, e.g. when the selected chat vanished.
    pub fn clear_selection(&mut self) {
        self.selected_chat_id = None;
        if self.layout == PanelLayout::MobileThread {
            self.layout = PanelLayout::MobileList;
        }
    }

    pub fn visible_panels(&self) -> VisiblePanels {
        let selected = self.selected_chat_id.is_some();
        match self.layout {
            PanelLayout::Desktop => VisiblePanels {
                sidebar: true,
                thread: selected,
                info: selected,
            },
            PanelLayout::MobileList => VisiblePanels {
                sidebar: true,
                thread: false,
                info: false,
            },
            PanelLayout::MobileThread => VisiblePanels {
                sidebar: false,
                thread: selected,
                info: false,
            },
        }
    }
}

fn mobile_layout_for(has_selection: bool) -> PanelLayout {
    if has_selection {
        PanelLayout::MobileThread
    } else {
        PanelLayout::MobileList
    }
}
