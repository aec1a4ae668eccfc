//! Tools the tutorbot workflow can call.

mod python;

pub use python::{
    ExecutionOutput, PythonInterpreter, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_PYTHON_PROGRAM,
    DEFAULT_TIMEOUT,
};
