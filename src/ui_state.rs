//! Auxiliary UI state: dialog visibility and sidebar collapse.
//!
//! Plain flags with no persistence and no coupling to the chat session.

/// Visibility flags for the modal panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialogState {
    pub show_document_manager: bool,
    pub show_settings: bool,
}

impl DialogState {
    pub fn open_document_manager(&mut self) {
        self.show_document_manager = true;
    }

    pub fn close_document_manager(&mut self) {
        self.show_document_manager = false;
    }

    pub fn open_settings(&mut self) {
        self.show_settings = true;
    }

    pub fn close_settings(&mut self) {
        self.show_settings = false;
    }
}

/// Collapse state for the conversation sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SidebarState {
    pub collapsed: bool,
}

impl SidebarState {
    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }
}
