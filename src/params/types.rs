//! Parameter descriptor types.

/// The declared type of a device parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Integer,
    Float,
    String,
    Enumeration,
    Boolean,
    Command,
}

/// A typed parameter value. `Command` parameters carry no value; they are
/// executed, not read or written.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Integer(i64),
    Float(f64),
    String(String),
    Enumeration(String),
    Boolean(bool),
    Command,
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Integer(_) => ParameterKind::Integer,
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::String(_) => ParameterKind::String,
            ParameterValue::Enumeration(_) => ParameterKind::Enumeration,
            ParameterValue::Boolean(_) => ParameterKind::Boolean,
            ParameterValue::Command => ParameterKind::Command,
        }
    }

    /// Display form, as cached by a parameter collection.
    pub fn display(&self) -> String {
        match self {
            ParameterValue::Integer(v) => v.to_string(),
            ParameterValue::Float(v) => v.to_string(),
            ParameterValue::String(v) | ParameterValue::Enumeration(v) => v.clone(),
            ParameterValue::Boolean(v) => v.to_string(),
            ParameterValue::Command => String::new(),
        }
    }
}

/// UI exposure tier of a parameter. `Invisible` parameters are API-only and
/// hidden from end-user surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Beginner,
    Expert,
    Guru,
    Invisible,
}

/// Runtime access flags of a parameter. These change as device state
/// changes (e.g. exposure controls lock while auto-exposure runs) and are
/// refreshed together with values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessMode {
    pub readable: bool,
    pub writable: bool,
}

impl AccessMode {
    pub const READ_ONLY: AccessMode = AccessMode {
        readable: true,
        writable: false,
    };
    pub const READ_WRITE: AccessMode = AccessMode {
        readable: true,
        writable: true,
    };
    pub const WRITE_ONLY: AccessMode = AccessMode {
        readable: false,
        writable: true,
    };
    pub const NONE: AccessMode = AccessMode {
        readable: false,
        writable: false,
    };
}

/// One named device setting.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Unique key within the owning device.
    pub name: String,
    pub kind: ParameterKind,
    /// Feature-tree category the device reports for this parameter.
    pub category: String,
    pub visibility: Visibility,
    pub access: AccessMode,
    /// Display value from the last import or refresh.
    pub value: String,
    /// Names of parameters whose meaning or range this parameter selects.
    pub selected: Vec<String>,
}

/// Snapshot returned by a device's parameter import: the descriptors it
/// could report plus the names that failed to import.
#[derive(Debug, Clone, Default)]
pub struct ParameterImport {
    pub parameters: Vec<Parameter>,
    pub failed: Vec<String>,
}
