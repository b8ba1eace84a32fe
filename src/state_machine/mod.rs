mod state;

pub use state::{
    AccessState, AccessStateMachine, AccessValue, AlertKind, BulkMode, RevokeLevel, Transition,
};
