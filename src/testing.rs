//! In-memory collaborators that record every call in order.

use crate::{
    error::{MintError, Result},
    generation::ImageGenerator,
    models::{GeneratedImage, MintRequest, StorageReceipt, TransactionReceipt, TransactionRequest},
    storage::ContentStore,
    wallet::Wallet,
};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Notify};

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

pub struct StubGenerator {
    log: CallLog,
    fail: bool,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl StubGenerator {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail: false,
            delay: None,
            gate: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Blocks every call until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        self.log.record(format!("generator.generate:{}", prompt));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(MintError::upstream("stub-generator", "503 Service Unavailable"));
        }
        Ok(GeneratedImage::new(vec![0xff, 0xd8, 0xff, 0xe0], "image/jpeg"))
    }
}

pub struct StubStore {
    log: CallLog,
    gateway: String,
    cid: String,
    fail: bool,
    delay: Option<Duration>,
}

impl StubStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            gateway: "ipfs.io".into(),
            cid: "bafyreigh2akiscaildc".into(),
            fail: false,
            delay: None,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ContentStore for StubStore {
    async fn store(&self, image: &GeneratedImage, request: &MintRequest) -> Result<StorageReceipt> {
        self.log
            .record(format!("store.store:{}:{}", request.name, image.len()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(MintError::upstream("stub-store", "401 Unauthorized"));
        }
        Ok(StorageReceipt::new(&self.gateway, self.cid.clone()))
    }
}

pub struct StubWallet {
    log: CallLog,
    account: watch::Sender<Option<Address>>,
    chain: Mutex<u64>,
    switchable: bool,
    revert: bool,
    confirm: bool,
    reject_send: bool,
    balance: u64,
    chain_gate: Option<Arc<Notify>>,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl StubWallet {
    pub fn new(log: CallLog) -> Self {
        let (account, _) = watch::channel(Some(Self::default_account()));
        Self {
            log,
            account,
            chain: Mutex::new(5),
            switchable: true,
            revert: false,
            confirm: true,
            reject_send: false,
            balance: 0,
            chain_gate: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn default_account() -> Address {
        Address::repeat_byte(0xaa)
    }

    pub fn on_chain(self, chain_id: u64) -> Self {
        *self.chain.lock().unwrap() = chain_id;
        self
    }

    pub fn without_account(self) -> Self {
        self.account.send_replace(None);
        self
    }

    pub fn refusing_switch(mut self) -> Self {
        self.switchable = false;
        self
    }

    pub fn reverting(mut self) -> Self {
        self.revert = true;
        self
    }

    pub fn never_confirming(mut self) -> Self {
        self.confirm = false;
        self
    }

    pub fn rejecting_send(mut self) -> Self {
        self.reject_send = true;
        self
    }

    pub fn with_balance(mut self, balance: u64) -> Self {
        self.balance = balance;
        self
    }

    /// Blocks every `chain_id` call until the gate is notified.
    pub fn gated_chain_check(mut self, gate: Arc<Notify>) -> Self {
        self.chain_gate = Some(gate);
        self
    }

    pub fn select_account(&self, account: Option<Address>) {
        self.account.send_replace(account);
    }

    pub fn current_chain(&self) -> u64 {
        *self.chain.lock().unwrap()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Wallet for StubWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.log.record("wallet.request_accounts");
        Ok(self.account.borrow().iter().copied().collect())
    }

    async fn chain_id(&self) -> Result<u64> {
        self.log.record("wallet.chain_id");
        if let Some(gate) = &self.chain_gate {
            gate.notified().await;
        }
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        self.log.record(format!("wallet.switch_chain:{}", chain_id));
        if self.switchable {
            *self.chain.lock().unwrap() = chain_id;
        }
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        self.log.record("wallet.send_transaction");
        if self.reject_send {
            return Err(MintError::Chain("transaction rejected by user".into()));
        }
        self.sent.lock().unwrap().push(tx);
        Ok(B256::repeat_byte(0x11))
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.log.record("wallet.transaction_receipt");
        if !self.confirm {
            return Ok(None);
        }
        Ok(Some(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(U64::from(7)),
            status: Some(if self.revert { U64::ZERO } else { U64::from(1) }),
        }))
    }

    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes> {
        self.log.record("wallet.call");
        Ok(U256::from(self.balance).abi_encode().into())
    }

    fn account_changes(&self) -> watch::Receiver<Option<Address>> {
        self.account.subscribe()
    }
}

/// Loopback HTTP server answering every request with the same canned response.
pub struct StubHttp {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubHttp {
    pub async fn respond(status: u16, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let body = body.into();
        let head = format!(
            "HTTP/1.1 {} Stub\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            status,
            content_type,
            body.len()
        );

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                seen.lock().unwrap().push(request);
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { url, requests }
    }

    pub async fn json(status: u16, body: serde_json::Value) -> Self {
        Self::respond(status, "application/json", body.to_string()).await
    }

    /// Raw requests received so far, headers and body.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !request_complete(&buf) {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
    let body = buf.len() - (end + 4);

    let length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());
    match length {
        Some(length) => body >= length,
        None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
        None => true,
    }
}
