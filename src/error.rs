pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while rendering a BPMN narrative.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    BpmnRequirement(String),

    #[error("{0}")]
    Cli(String),
}

// BpmnRequirement
pub(crate) const NO_PROCESS_FOUND: &str = "Nenhum processo encontrado no BPMN.";
