use async_trait::async_trait;
use hookflow_core::{
    BackendGateway, CallbackTransport, Handle, Initiated, Observation, Outputs, ProvisionError,
    ProvisioningRequest, RequestType, Result,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// One scripted answer to `describe`
#[derive(Debug, Clone)]
pub enum Reply {
    State(&'static str),
    Failed(&'static str, &'static str),
    Error(&'static str),
}

/// Backend that plays back a fixed script
pub struct ScriptedGateway {
    initiate: std::result::Result<Initiated, String>,
    replies: Mutex<VecDeque<Reply>>,
    /// Answer once the script runs out
    repeat: Reply,
    teardown: Option<std::result::Result<(), String>>,
    panic_on_initiate: bool,
    pub describe_calls: AtomicU32,
    pub teardown_calls: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedGateway {
    pub fn polling(handle: &str) -> Self {
        Self {
            initiate: Ok(Initiated::with_handle(Handle::new(handle))),
            replies: Mutex::new(VecDeque::new()),
            repeat: Reply::State("CREATING"),
            teardown: None,
            panic_on_initiate: false,
            describe_calls: AtomicU32::new(0),
            teardown_calls: AtomicU32::new(0),
        }
    }

    pub fn lookup(outputs: Outputs) -> Self {
        Self {
            initiate: Ok(Initiated::lookup(outputs)),
            ..Self::polling("unused")
        }
    }

    pub fn failing_initiate(message: &str) -> Self {
        Self {
            initiate: Err(message.to_string()),
            ..Self::polling("unused")
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_initiate: true,
            ..Self::polling("unused")
        }
    }

    pub fn with_initiated(mut self, initiated: Initiated) -> Self {
        self.initiate = Ok(initiated);
        self
    }

    pub fn then(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn pending_times(self, n: usize) -> Self {
        (0..n).fold(self, |gateway, _| gateway.then(Reply::State("CREATING")))
    }

    pub fn repeating(mut self, reply: Reply) -> Self {
        self.repeat = reply;
        self
    }

    pub fn with_teardown(mut self, outcome: std::result::Result<(), &str>) -> Self {
        self.teardown = Some(outcome.map_err(|e| e.to_string()));
        self
    }

    pub fn describes(&self) -> u32 {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> u32 {
        self.teardown_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn initiate(&self, _properties: &Outputs) -> Result<Initiated> {
        if self.panic_on_initiate {
            panic!("backend client blew up");
        }
        self.initiate
            .clone()
            .map_err(ProvisionError::Api)
    }

    async fn describe(&self, _handle: &Handle) -> Result<Observation> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.repeat.clone());
        match reply {
            Reply::State(state) => Ok(Observation::new(state)),
            Reply::Failed(state, detail) => Ok(Observation::new(state).with_detail(detail)),
            Reply::Error(message) => Err(ProvisionError::Api(message.to_string())),
        }
    }

    fn supports_teardown(&self) -> bool {
        self.teardown.is_some()
    }

    async fn teardown(&self, _handle: &Handle) -> Result<()> {
        self.teardown_calls.fetch_add(1, Ordering::SeqCst);
        match &self.teardown {
            Some(Err(message)) => Err(ProvisionError::Api(message.clone())),
            _ => Ok(()),
        }
    }
}

/// Transport that records every body instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    pub bodies: Mutex<Vec<serde_json::Value>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn sent(&self) -> Vec<serde_json::Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallbackTransport for RecordingTransport {
    async fn put(&self, _url: &str, body: Vec<u8>) -> Result<()> {
        let value = serde_json::from_slice(&body)?;
        self.bodies.lock().unwrap().push(value);
        Ok(())
    }
}

#[allow(dead_code)]
pub fn request(request_type: RequestType, response_url: &str) -> ProvisioningRequest {
    ProvisioningRequest {
        request_type,
        stack_id: "arn:aws:cloudformation:us-east-1:123456789012:stack/msk/1".to_string(),
        request_id: "req-1".to_string(),
        logical_resource_id: "MskResource".to_string(),
        physical_resource_id: None,
        response_url: response_url.to_string(),
        resource_type: Some("Custom::MskResource".to_string()),
        resource_properties: Outputs::new(),
    }
}
