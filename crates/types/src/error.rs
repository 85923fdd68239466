use thiserror::Error;

/// Errors raised while declaring types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
	#[error("type already declared: {0}")]
	AlreadyDeclared(String),
	#[error("enum {0} declares no constants")]
	EmptyEnum(String),
	#[error("{name} cannot extend {supertype}")]
	InvalidSupertype { name: String, supertype: String },
	#[error("{name} lists {interface} as an interface, but it is not one")]
	NotAnInterface { name: String, interface: String },
}
