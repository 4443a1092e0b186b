//! User-visible exception payloads.
//!
//! An [`ExceptionValue`] packages the exception class metadata, the
//! underlying exception object (when one was constructed), the message, the
//! raise-site position, and the call-stack snapshot taken *at raise time* —
//! handlers further up see where the exception happened, not where it was
//! caught. It flows through
//! [`ExecutionContext`](crate::context::ExecutionContext)'s exception slot
//! and is sampled by the evaluator at statement boundaries.

use std::{fmt, rc::Rc};

use crate::{
    callstack::{CodeLoc, StackFrame},
    meta::ClassRef,
    object::ObjectRef,
};

/// Shared handle to an exception payload.
pub type ExceptionRef = Rc<ExceptionValue>;

/// A raised exception.
#[derive(Debug)]
pub struct ExceptionValue {
    /// The exception class, when known.
    pub class: Option<ClassRef>,
    /// The exception object, when the exception was raised from one.
    pub object: Option<ObjectRef>,
    /// The message.
    pub message: String,
    /// Raise-site position, when known.
    pub position: Option<CodeLoc>,
    /// Call-stack snapshot taken at raise time, outermost frame first.
    pub stack_trace: Vec<StackFrame>,
}

impl ExceptionValue {
    /// Constructs an exception directly from class metadata.
    pub fn new(
        class: Option<ClassRef>,
        message: impl Into<String>,
        position: Option<CodeLoc>,
        stack_trace: Vec<StackFrame>,
    ) -> ExceptionRef {
        Rc::new(Self {
            class,
            object: None,
            message: message.into(),
            position,
            stack_trace,
        })
    }

    /// Wraps an existing exception object, extracting the class from the
    /// instance and the message from its `Message` field when that field
    /// holds a string.
    pub fn from_object(object: &ObjectRef, position: Option<CodeLoc>, stack_trace: Vec<StackFrame>) -> ExceptionRef {
        let class = object.borrow().class().clone();
        let message = match object.borrow().get_field("Message") {
            Some(crate::value::Value::Str(s)) => s.to_string(),
            _ => String::new(),
        };
        Rc::new(Self {
            class: Some(class),
            object: Some(object.clone()),
            message,
            position,
            stack_trace,
        })
    }

    /// The exception class name, defaulting to `Exception`.
    #[must_use]
    pub fn class_name(&self) -> String {
        self.class
            .as_ref()
            .map_or_else(|| "Exception".to_string(), |c| c.borrow().name.clone())
    }

    /// Renders the stack trace, innermost frame first.
    #[must_use]
    pub fn format_stack_trace(&self) -> String {
        let mut out = String::new();
        for frame in self.stack_trace.iter().rev() {
            out.push_str("  at ");
            out.push_str(&frame.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ExceptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{class}: {message}", class = self.class_name(), message = self.message)?;
        if let Some(position) = &self.position {
            write!(f, " [{position}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        meta::{ClassMetadata, FieldMetadata},
        object::ObjectInstance,
        value::Value,
    };

    #[test]
    fn from_object_extracts_class_and_message() {
        let class = ClassMetadata::new_ref("ERangeError");
        class.borrow_mut().add_field(FieldMetadata::new("Message", "String"));
        let obj = ObjectInstance::new(&class, None);
        obj.borrow_mut().set_field("Message", Value::string("value out of range"));

        let exc = ExceptionValue::from_object(&obj, Some(CodeLoc::new(3, 9)), vec![]);
        assert_eq!(exc.class_name(), "ERangeError");
        assert_eq!(exc.message, "value out of range");
        assert_eq!(exc.to_string(), "ERangeError: value out of range [line 3, column 9]");
    }

    #[test]
    fn stack_trace_renders_innermost_first() {
        let trace = vec![
            StackFrame::new("Outer", "main.pas", CodeLoc::new(2, 1)),
            StackFrame::new("Inner", "main.pas", CodeLoc::new(7, 5)),
        ];
        let exc = ExceptionValue::new(None, "boom", None, trace);
        let rendered = exc.format_stack_trace();
        let inner_at = rendered.find("Inner").unwrap();
        let outer_at = rendered.find("Outer").unwrap();
        assert!(inner_at < outer_at, "innermost frame first:\n{rendered}");
    }
}
