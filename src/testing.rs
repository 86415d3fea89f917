//! Recording marker surface for tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::MarkerIcon;
use crate::marker::{MarkerHandle, MarkerSurface};
use crate::values::LatLng;

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEvent {
    Created([f64; 2]),
    Icon(String),
    Content(String),
    PopupShown,
    PopupHidden,
    Attached,
    Removed,
}

type Log = Rc<RefCell<Vec<Vec<MarkerEvent>>>>;

/// Surface that logs every call, one event list per marker in creation order
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: Log,
}

pub struct RecordingMarker {
    index: usize,
    log: Log,
}

impl RecordingMarker {
    fn record(&self, event: MarkerEvent) {
        self.log.borrow_mut()[self.index].push(event);
    }
}

impl MarkerSurface for RecordingSurface {
    type Marker = RecordingMarker;

    fn create_marker(&self, position: LatLng) -> RecordingMarker {
        let mut log = self.log.borrow_mut();
        log.push(vec![MarkerEvent::Created(position.as_pair())]);
        RecordingMarker {
            index: log.len() - 1,
            log: Rc::clone(&self.log),
        }
    }
}

impl MarkerHandle<RecordingSurface> for RecordingMarker {
    fn set_icon(&mut self, icon: &MarkerIcon) {
        self.record(MarkerEvent::Icon(icon.url.clone()));
    }

    fn bind_content(&mut self, html: &str) {
        self.record(MarkerEvent::Content(html.to_string()));
    }

    fn show_popup(&mut self) {
        self.record(MarkerEvent::PopupShown);
    }

    fn hide_popup(&mut self) {
        self.record(MarkerEvent::PopupHidden);
    }

    fn attach(&mut self, _surface: &RecordingSurface) {
        self.record(MarkerEvent::Attached);
    }
}

impl Drop for RecordingMarker {
    fn drop(&mut self) {
        self.record(MarkerEvent::Removed);
    }
}

impl RecordingSurface {
    pub fn created(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn events_for(&self, marker: usize) -> Vec<MarkerEvent> {
        self.log.borrow()[marker].clone()
    }

    /// Forget recorded events, keeping one slot per marker
    pub fn clear(&self) {
        for events in self.log.borrow_mut().iter_mut() {
            events.clear();
        }
    }

    pub fn current_icon(&self, marker: usize) -> Option<String> {
        self.log.borrow()[marker].iter().rev().find_map(|e| match e {
            MarkerEvent::Icon(url) => Some(url.clone()),
            _ => None,
        })
    }

    pub fn popup_open(&self, marker: usize) -> bool {
        self.log.borrow()[marker]
            .iter()
            .rev()
            .find_map(|e| match e {
                MarkerEvent::PopupShown => Some(true),
                MarkerEvent::PopupHidden => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn removed(&self, marker: usize) -> bool {
        self.log.borrow()[marker].contains(&MarkerEvent::Removed)
    }

    /// Number of popups currently open
    pub fn open_popups(&self) -> usize {
        (0..self.created()).filter(|&m| self.popup_open(m) && !self.removed(m)).count()
    }
}
