//! Node/edge data model shared by every stage of the renderer.
//!
//! BPMN elements are represented as a tagged `NodeKind` enum keyed by the BPMN
//! `id` attribute directly rather than a dense local index, since lookups here
//! routinely cross process boundaries (artifacts, participants, message flows).

use std::fmt::{self, Display};

pub type NodeId = String;
pub type FlowId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Generic,
    User,
    Service,
    Send,
    Receive,
    Manual,
}

impl TaskKind {
    pub fn detail_label(self) -> &'static str {
        match self {
            TaskKind::Generic => "Sem tipo",
            TaskKind::User => "Atividade de Usuário",
            TaskKind::Service => "Atividade de Serviço",
            TaskKind::Send => "Atividade de Envio",
            TaskKind::Receive => "Atividade de Recebimento",
            TaskKind::Manual => "Atividade Manual",
        }
    }

    /// Category label per task subtype, used as the gateway/task fallback
    /// display wherever a node has no name (e.g. message-flow reporting).
    pub fn category_label(self) -> &'static str {
        match self {
            TaskKind::Generic => "Atividade",
            TaskKind::User => "Atividade (usuário)",
            TaskKind::Service => "Atividade (serviço)",
            TaskKind::Send => "Atividade (envio)",
            TaskKind::Receive => "Atividade (recebimento)",
            TaskKind::Manual => "Atividade (manual)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubprocessKind {
    Inline,
    CallActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayKind {
    Exclusive,
    Parallel,
    Inclusive,
    EventBased,
}

impl GatewayKind {
    pub fn label(self) -> &'static str {
        match self {
            GatewayKind::Exclusive => "Gateway exclusivo",
            GatewayKind::Parallel => "Gateway paralelo",
            GatewayKind::Inclusive => "Gateway inclusivo",
            GatewayKind::EventBased => "Gateway baseado em evento",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPosition {
    Start,
    End,
    IntermediateThrow,
    IntermediateCatch,
    Boundary,
}

impl EventPosition {
    pub fn label(self) -> &'static str {
        match self {
            EventPosition::Start => "Evento de início",
            EventPosition::End => "Evento de fim",
            EventPosition::IntermediateThrow | EventPosition::IntermediateCatch => {
                "Evento intermediário"
            }
            EventPosition::Boundary => "Evento intermediário (fronteira)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchThrow {
    Catch,
    Throw,
}

impl Display for CatchThrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatchThrow::Catch => write!(f, "captura"),
            CatchThrow::Throw => write!(f, "disparo"),
        }
    }
}

/// Event-specific detail, populated only for `NodeKind::Event`.
#[derive(Debug, Clone, Default)]
pub struct EventData {
    pub position: Option<EventPosition>,
    /// Flavor extracted from the nested `*EventDefinition` child, e.g. "timer",
    /// "message", "link". Empty when the event carries no definition (a "none" event).
    pub flavor: String,
    /// Link name, set only for `flavor == "link"`.
    pub link_name: Option<String>,
    /// Set only when the owning link name has at least one catch AND one throw.
    pub catch_throw: Option<CatchThrow>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Task(TaskKind),
    Subprocess(SubprocessKind),
    Gateway(GatewayKind),
    Event(EventData),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: Option<String>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_gateway(&self) -> bool {
        matches!(self.kind, NodeKind::Gateway(_))
    }

    pub fn is_parallel_gateway(&self) -> bool {
        matches!(self.kind, NodeKind::Gateway(GatewayKind::Parallel))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(sem nome)")
    }

    /// Category label used when a gateway has no name, and as the fallback
    /// element display in message-flow reporting.
    pub fn category_label(&self) -> &'static str {
        match &self.kind {
            NodeKind::Task(kind) => kind.category_label(),
            NodeKind::Subprocess(SubprocessKind::Inline) => "Subprocesso",
            NodeKind::Subprocess(SubprocessKind::CallActivity) => {
                "Subprocesso (call activity)"
            }
            NodeKind::Gateway(kind) => kind.label(),
            NodeKind::Event(data) => data.position.map(EventPosition::label).unwrap_or("Evento"),
        }
    }
}

/// Directed edge between two nodes.
#[derive(Debug, Clone)]
pub struct SequenceFlow {
    pub id: FlowId,
    pub name: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    /// True for flows synthesised during graph repair (link resolution).
    pub synthetic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    Document,
    System,
    Annotation,
}

#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn centre(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains_point(&self, (px, py): (f64, f64)) -> bool {
        self.x <= px && px <= self.x + self.w && self.y <= py && py <= self.y + self.h
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let x_overlap = (self.x + self.w).min(other.x + other.w) - self.x.max(other.x);
        let y_overlap = (self.y + self.h).min(other.y + other.h) - self.y.max(other.y);
        x_overlap.max(0.0) * y_overlap.max(0.0)
    }
}
