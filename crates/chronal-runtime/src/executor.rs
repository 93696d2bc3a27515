//! The map-calc boundary.
//!
//! The engine never touches raster data itself; it hands `name` and
//! `expression` pairs to a [`MapCalcExecutor`] and gets back the value
//! range of the computed map. The process executor shells out to an
//! external calculator, the mock evaluates expressions over
//! constant-valued maps in memory.

use std::process::Command;
use std::sync::Mutex;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use tracing::debug;

use chronal_core::SpatialExtent;
use chronal_parser::ast::{ArithOp, Expr};

/// What a finished map computation reports back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapProduct {
    /// Minimum cell value, absent when the result is entirely null.
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub spatial: Option<SpatialExtent>,
}

impl MapProduct {
    pub fn is_null(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Boundary to the external map calculator. Implementations must be
/// callable from worker threads.
pub trait MapCalcExecutor: Sync {
    fn run(&self, output: &str, expression: &str) -> Result<MapProduct, ExecutionError>;

    /// Remove a computed map; used for intermediates and aborted runs.
    fn remove(&self, name: &str) -> Result<(), ExecutionError> {
        let _ = name;
        Ok(())
    }
}

/// Shells out one process per map: `<program> <args..> <name> <expr>`.
///
/// The calculator signals an all-null result by omitting the range;
/// otherwise it prints `min=<v>` and `max=<v>` lines on stdout.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

fn parse_field(stdout: &str, key: &str) -> Option<f64> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(key))
        .and_then(|v| v.trim().parse().ok())
}

impl MapCalcExecutor for ProcessExecutor {
    fn run(&self, output: &str, expression: &str) -> Result<MapProduct, ExecutionError> {
        debug!(map = %output, program = %self.program, "spawning calculator");
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg(output)
            .arg(expression)
            .output()
            .map_err(|e| ExecutionError::new(format!("spawn {}: {e}", self.program)))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ExecutionError::new(format!(
                "calculator exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&result.stdout);
        Ok(MapProduct {
            min: parse_field(&stdout, "min="),
            max: parse_field(&stdout, "max="),
            spatial: None,
        })
    }

    fn remove(&self, name: &str) -> Result<(), ExecutionError> {
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg("--remove")
            .arg(name)
            .output()
            .map_err(|e| ExecutionError::new(format!("spawn {}: {e}", self.program)))?;
        if !result.status.success() {
            return Err(ExecutionError::new(format!(
                "removal of <{name}> exited with {}",
                result.status
            )));
        }
        Ok(())
    }
}

/// In-memory executor over constant-valued maps.
///
/// Every map holds one value (or null); computed maps feed later
/// expressions, so chained intermediates evaluate the way the real
/// calculator would.
#[derive(Debug, Default)]
pub struct MockExecutor {
    values: Mutex<IndexMap<String, Option<f64>>>,
    failing: Mutex<IndexSet<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&self, id: impl Into<String>, value: f64) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(id.into(), Some(value));
        }
    }

    /// Mark a map as entirely null.
    pub fn set_null(&self, id: impl Into<String>) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(id.into(), None);
        }
    }

    /// Force the computation of `name` to fail.
    pub fn fail_on(&self, name: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(name.into());
        }
    }

    /// Value of a computed or seeded map; `None` when the map does not
    /// exist, `Some(None)` when it exists but is null.
    pub fn value(&self, id: &str) -> Option<Option<f64>> {
        self.values.lock().ok().and_then(|v| v.get(id).copied())
    }

    fn lookup(&self, id: &str) -> Result<Option<f64>, ExecutionError> {
        let values = self
            .values
            .lock()
            .map_err(|_| ExecutionError::new("executor state poisoned"))?;
        values
            .get(id)
            .copied()
            .ok_or_else(|| ExecutionError::new(format!("raster map <{id}> not found")))
    }

    /// Nulls propagate through arithmetic like in the real calculator.
    fn eval(&self, expr: &Expr) -> Result<Option<f64>, ExecutionError> {
        match expr {
            Expr::Number(v) => Ok(Some(*v)),
            Expr::Identifier(id) => self.lookup(id),
            // A spatial shift of a constant map is the map itself.
            Expr::Neighbor { base, .. } => self.lookup(base),
            Expr::Binary {
                op, left, right, ..
            } => {
                let (Some(l), Some(r)) = (self.eval(left)?, self.eval(right)?) else {
                    return Ok(None);
                };
                Ok(Some(match op {
                    ArithOp::Add => l + r,
                    ArithOp::Sub => l - r,
                    ArithOp::Mul => l * r,
                    ArithOp::Div => l / r,
                    ArithOp::Mod => l % r,
                }))
            }
        }
    }
}

impl MapCalcExecutor for MockExecutor {
    fn run(&self, output: &str, expression: &str) -> Result<MapProduct, ExecutionError> {
        if let Ok(failing) = self.failing.lock() {
            if failing.contains(output) {
                return Err(ExecutionError::new(format!("forced failure of <{output}>")));
            }
        }
        let expr = chronal_parser::parse_expr(expression)
            .map_err(|e| ExecutionError::new(format!("bad expression for <{output}>: {e}")))?;
        let value = self.eval(&expr)?;
        if let Ok(mut values) = self.values.lock() {
            values.insert(output.to_string(), value);
        }
        Ok(MapProduct {
            min: value,
            max: value,
            spatial: None,
        })
    }

    fn remove(&self, name: &str) -> Result<(), ExecutionError> {
        if let Ok(mut values) = self.values.lock() {
            values.shift_remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_evaluates_chained_expressions() {
        let mock = MockExecutor::new();
        mock.set_value("a@m", 2.0);
        mock.set_value("b@m", 3.0);
        let product = mock.run("t0", "((a@m + b@m) * 2)").unwrap();
        assert_eq!(product.min, Some(10.0));
        let product = mock.run("out", "(t0 - a@m)").unwrap();
        assert_eq!(product.min, Some(8.0));
    }

    #[test]
    fn mock_propagates_null() {
        let mock = MockExecutor::new();
        mock.set_value("a@m", 2.0);
        mock.set_null("b@m");
        let product = mock.run("out", "(a@m + b@m)").unwrap();
        assert!(product.is_null());
    }

    #[test]
    fn mock_rejects_unknown_maps() {
        let mock = MockExecutor::new();
        let err = mock.run("out", "missing@m").unwrap_err();
        assert!(err.message.contains("missing@m"), "{}", err.message);
    }

    #[test]
    fn process_output_parsing() {
        assert_eq!(parse_field("min=1.5\nmax=2\n", "min="), Some(1.5));
        assert_eq!(parse_field("min=1.5\nmax=2\n", "max="), Some(2.0));
        assert_eq!(parse_field("done\n", "min="), None);
    }
}
