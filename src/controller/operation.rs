use std::sync::Arc;

use serde_json::Value;

/// An input stream attached to an operation. Payloads are shared, so a request
/// copy never duplicates the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStream {
    data: Arc<[u8]>,
}

impl InputStream {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: Arc::from(data.into().into_boxed_slice()) }
    }

    pub fn bytes(&self) -> &[u8] { &self.data }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationAttachments {
    pub input_streams: Vec<InputStream>,
    /// Close the streams once the operation has executed.
    pub auto_close_streams: bool,
}

impl OperationAttachments {
    pub fn new(input_streams: Vec<InputStream>, auto_close_streams: bool) -> Self {
        Self { input_streams, auto_close_streams }
    }
}

/// A management request: the request document plus optional stream attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    node: Value,
    attachments: Option<OperationAttachments>,
}

impl Operation {
    pub fn new(node: Value) -> Self {
        Self { node, attachments: None }
    }

    pub fn with_attachments(node: Value, attachments: OperationAttachments) -> Self {
        Self { node, attachments: Some(attachments) }
    }

    pub fn node(&self) -> &Value { &self.node }

    pub fn attachments(&self) -> Option<&OperationAttachments> { self.attachments.as_ref() }

    pub fn input_streams(&self) -> &[InputStream] {
        self.attachments.as_ref().map(|a| a.input_streams.as_slice()).unwrap_or(&[])
    }

    pub fn is_auto_close_streams(&self) -> bool {
        self.attachments.as_ref().map(|a| a.auto_close_streams).unwrap_or(false)
    }

    /// The copy actually handed to the controller. Attachments are carried over when
    /// present; a bare operation stays bare.
    pub fn request_copy(&self) -> Operation {
        match &self.attachments {
            None => Operation::new(self.node.clone()),
            Some(a) => Operation::with_attachments(
                self.node.clone(),
                OperationAttachments::new(a.input_streams.clone(), a.auto_close_streams),
            ),
        }
    }

    /// Name of the operation as found under `operation` in the request document.
    pub fn name(&self) -> Option<&str> {
        self.node.get("operation").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_copy_keeps_attachments() {
        let op = Operation::with_attachments(
            json!({"operation": "upload"}),
            OperationAttachments::new(vec![InputStream::new(b"abc".to_vec())], true),
        );
        let copy = op.request_copy();
        assert_eq!(copy, op);
        assert_eq!(copy.input_streams()[0].bytes(), b"abc");
        assert!(copy.is_auto_close_streams());
    }

    #[test]
    fn request_copy_of_bare_operation_has_no_attachments() {
        let op = Operation::new(json!({"operation": "read-resource"}));
        let copy = op.request_copy();
        assert!(copy.attachments().is_none());
        assert!(copy.input_streams().is_empty());
        assert!(!copy.is_auto_close_streams());
        assert_eq!(copy.name(), Some("read-resource"));
    }
}
