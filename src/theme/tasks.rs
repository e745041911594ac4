//! Tasks: everything the scheduler can put on a timer

use serde::Serialize;
use std::fmt;

use crate::clock::TimerId;
use crate::surface::ElementId;

/// The recurring tasks, one per effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskName {
    StaticRender,
    ElementCorrupt,
    PageCorrupt,
    TextCorrupt,
    SubliminalRotate,
    EscalationTick,
}

impl TaskName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::StaticRender => "static-render",
            TaskName::ElementCorrupt => "element-corrupt",
            TaskName::PageCorrupt => "page-corrupt",
            TaskName::TextCorrupt => "text-corrupt",
            TaskName::SubliminalRotate => "subliminal-rotate",
            TaskName::EscalationTick => "escalation-tick",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a transient mutation changed and must put back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Target {
    ElementFilter(ElementId),
    PageFilter,
    Text(ElementId),
    Title,
}

/// Original state of a [`Target`] and the timer that will restore it.
#[derive(Debug, Clone)]
pub(crate) struct Hold {
    pub original: Option<String>,
    pub timer: TimerId,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Task {
    Recurring(TaskName),
    Revert(Target),
    ScareFade(ElementId),
    ScareRemove(ElementId),
    RestoreTone,
    RemoveInterference(ElementId),
    HideMarker,
}
