use std::time::{Duration, Instant};

use chainviz_core::{
    chain::{auto_mine_payload, validate_auto_mine_count},
    constants::{AUTO_MINE_MAX, AUTO_MINE_MIN},
    hash,
    mine::mine_parallel,
    Block, BlockEdit, BlockReport, Chain, ChainError, Difficulty, MiningControl,
};
use ratatui::widgets::{ScrollbarState, TableState};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::theme::Theme;
use crate::Args;

pub const MIN_UI_DIFFICULTY: u32 = 1;
pub const MAX_UI_DIFFICULTY: u32 = 4;
const MINED_STATUS_TTL: Duration = Duration::from_secs(3);

// Each row in the chain table is 1 line high
pub const ITEM_HEIGHT: usize = 1;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Chain,
    Mine,
    AutoMine,
    Tamper,
    Ledger,
    HashDemo,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Chain,
        Tab::Mine,
        Tab::AutoMine,
        Tab::Tamper,
        Tab::Ledger,
        Tab::HashDemo,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Chain => "Chain",
            Tab::Mine => "Mine",
            Tab::AutoMine => "Auto-Mine",
            Tab::Tamper => "Tamper",
            Tab::Ledger => "Ledger",
            Tab::HashDemo => "HashDemo",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Data,
    Timestamp,
    PreviousHash,
    Nonce,
    Hash,
}

impl EditField {
    const ALL: [EditField; 5] = [
        EditField::Data,
        EditField::Timestamp,
        EditField::PreviousHash,
        EditField::Nonce,
        EditField::Hash,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditField::Data => "data",
            EditField::Timestamp => "timestamp",
            EditField::PreviousHash => "previous hash",
            EditField::Nonce => "nonce",
            EditField::Hash => "hash",
        }
    }

    fn step(self, forward: bool) -> Self {
        let n = Self::ALL.len();
        let i = self as usize;
        Self::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
    }

    fn read(self, block: &Block) -> String {
        match self {
            EditField::Data => block.data().to_string(),
            EditField::Timestamp => block.timestamp().to_string(),
            EditField::PreviousHash => block.previous_hash().to_string(),
            EditField::Nonce => block.nonce().to_string(),
            EditField::Hash => block.hash().to_string(),
        }
    }

    fn to_edit(self, value: &str) -> Result<BlockEdit, String> {
        let number = |v: &str| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| format!("{} must be a non-negative integer: {e}", self.label()))
        };
        Ok(match self {
            EditField::Data => BlockEdit::default().data(value),
            EditField::Timestamp => BlockEdit::default().timestamp(number(value)?),
            EditField::PreviousHash => BlockEdit::default().previous_hash(value),
            EditField::Nonce => BlockEdit::default().nonce(number(value)?),
            EditField::Hash => BlockEdit::default().hash(value),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningStatus {
    Idle,
    Mining,
    Mined { elapsed_ms: u64, at: Instant },
}

/// A block being mined on the blocking pool.
#[derive(Debug)]
pub struct MiningJob {
    pub control: MiningControl,
    pub started: Instant,
    /// `(done, total)` while auto-mining.
    pub progress: Option<(usize, usize)>,
    handle: JoinHandle<chainviz_core::Result<Block>>,
}

#[derive(Debug)]
pub struct App {
    pub theme: Theme,
    pub tab: Tab,
    pub chain: Chain,
    pub reports: Vec<BlockReport>,
    // chain table
    pub cursor: usize,
    pub table_state: TableState,
    pub scroll: ScrollbarState,
    pub popup: bool,
    // mining
    pub mine_data: String,
    pub mine_status: MiningStatus,
    pub status: Option<String>,
    pub auto_count: usize,
    pub job: Option<MiningJob>,
    // tamper
    pub edit_field: EditField,
    pub edit_buffer: String,
    // hash demo
    pub hash_input: String,
    pub hash_output: String,
    pub hash_leading_zeros: u32,
}

impl App {
    pub fn new(args: Args) -> anyhow::Result<Self> {
        let chain = Chain::new(Difficulty::new(args.difficulty)?);
        let mut app = Self {
            theme: args.theme,
            tab: Tab::default(),
            chain,
            reports: Vec::new(),
            cursor: 0,
            table_state: TableState::default(),
            scroll: ScrollbarState::default(),
            popup: false,
            mine_data: String::new(),
            mine_status: MiningStatus::Idle,
            status: None,
            auto_count: 3,
            job: None,
            edit_field: EditField::Data,
            edit_buffer: String::new(),
            hash_input: String::new(),
            hash_output: String::new(),
            hash_leading_zeros: 0,
        };
        app.refresh_validation();
        app.load_edit_buffer();
        app.update_hash_demo();
        Ok(app)
    }

    pub fn is_valid(&self) -> bool {
        self.chain.is_valid()
    }

    pub fn is_mining(&self) -> bool {
        self.job.is_some()
    }

    /// Re-run the audit; called after anything touches the chain.
    pub fn refresh_validation(&mut self) {
        self.reports = self.chain.audit();
        if self.cursor >= self.chain.len() {
            self.cursor = self.chain.len() - 1;
        }
        self.table_state.select(Some(self.cursor));
        self.scroll = self
            .scroll
            .content_length(self.chain.len() * ITEM_HEIGHT)
            .position(self.cursor * ITEM_HEIGHT);
    }

    pub fn select(&mut self, down: bool) {
        let len = self.chain.len();
        self.cursor = if down {
            (self.cursor + 1) % len
        } else {
            (self.cursor + len - 1) % len
        };
        self.table_state.select(Some(self.cursor));
        self.scroll = self.scroll.position(self.cursor * ITEM_HEIGHT);
        self.load_edit_buffer();
    }

    pub fn step_difficulty(&mut self, up: bool) {
        if self.is_mining() {
            return;
        }
        let current = self.chain.difficulty().get();
        let next = if up {
            (current + 1).min(MAX_UI_DIFFICULTY)
        } else {
            current.saturating_sub(1).max(MIN_UI_DIFFICULTY)
        };
        if next != current {
            if let Ok(d) = Difficulty::new(next) {
                self.chain.set_difficulty(d);
                self.refresh_validation();
            }
        }
    }

    pub fn step_auto_count(&mut self, up: bool) {
        self.auto_count = if up {
            (self.auto_count + 1).min(AUTO_MINE_MAX)
        } else {
            self.auto_count.saturating_sub(1).max(AUTO_MINE_MIN)
        };
    }

    pub fn start_mining(&mut self) {
        let data = self.mine_data.trim().to_string();
        if data.is_empty() || self.is_mining() {
            return;
        }
        let candidate = self.chain.candidate(data);
        self.spawn_job(candidate, None);
    }

    pub fn start_auto_mine(&mut self) {
        if self.is_mining() {
            return;
        }
        if let Err(e) = validate_auto_mine_count(self.auto_count) {
            self.status = Some(e.to_string());
            return;
        }
        let candidate = self
            .chain
            .candidate(auto_mine_payload(self.chain.len() as u64));
        self.spawn_job(candidate, Some((0, self.auto_count)));
    }

    fn spawn_job(&mut self, candidate: Block, progress: Option<(usize, usize)>) {
        let control = MiningControl::new();
        let difficulty = self.chain.difficulty();
        let worker = control.clone();
        info!(index = candidate.index(), %difficulty, "mining started");
        let handle =
            tokio::task::spawn_blocking(move || mine_parallel(&candidate, difficulty, &worker));
        self.mine_status = MiningStatus::Mining;
        self.status = None;
        self.job = Some(MiningJob {
            control,
            started: Instant::now(),
            progress,
            handle,
        });
    }

    /// Collect a finished job, append its block, and queue the next
    /// auto-mine step if one is pending. No-op while the job still runs.
    pub async fn poll_mining(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        if !job.handle.is_finished() {
            self.job = Some(job);
            return;
        }
        let elapsed_ms = job.started.elapsed().as_millis() as u64;
        match job.handle.await {
            Ok(Ok(block)) => {
                let nonce = block.nonce();
                match self.chain.push_mined(block).map(|b| b.index()) {
                    Ok(index) => {
                        self.status = Some(format!(
                            "Mined block #{index} nonce={nonce} in {elapsed_ms}ms ({} attempts)",
                            job.control.attempts()
                        ));
                        self.mine_status = MiningStatus::Mined {
                            elapsed_ms,
                            at: Instant::now(),
                        };
                        self.mine_data.clear();
                        if let Some((done, total)) = job.progress {
                            if done + 1 < total {
                                let next = self
                                    .chain
                                    .candidate(auto_mine_payload(self.chain.len() as u64));
                                self.spawn_job(next, Some((done + 1, total)));
                            }
                        }
                    }
                    Err(e) => self.fail(e.to_string()),
                }
            }
            Ok(Err(e @ ChainError::MiningCancelled { .. })) => {
                self.status = Some(e.to_string());
                self.mine_status = MiningStatus::Idle;
            }
            Ok(Err(e)) => self.fail(e.to_string()),
            Err(e) => self.fail(format!("mining task failed: {e}")),
        }
        self.refresh_validation();
    }

    fn fail(&mut self, message: String) {
        warn!(%message, "mining failed");
        self.status = Some(message);
        self.mine_status = MiningStatus::Idle;
    }

    pub fn cancel_mining(&mut self) {
        if let Some(job) = &self.job {
            job.control.cancel();
        }
    }

    /// Drop every mined block. An in-flight job is cancelled and forgotten.
    pub fn reset(&mut self) {
        if let Some(job) = self.job.take() {
            job.control.cancel();
        }
        self.chain.reset();
        self.cursor = 0;
        self.mine_status = MiningStatus::Idle;
        self.status = Some("Chain reset to genesis".into());
        self.refresh_validation();
        self.load_edit_buffer();
    }

    pub fn step_edit_field(&mut self, forward: bool) {
        self.edit_field = self.edit_field.step(forward);
        self.load_edit_buffer();
    }

    pub fn load_edit_buffer(&mut self) {
        self.edit_buffer = self
            .chain
            .block(self.cursor as u64)
            .map(|b| self.edit_field.read(b))
            .unwrap_or_default();
    }

    /// Overwrite the selected block's field with the edit buffer.
    pub fn apply_edit(&mut self) {
        let edit = match self.edit_field.to_edit(&self.edit_buffer) {
            Ok(edit) => edit,
            Err(message) => {
                self.status = Some(message);
                return;
            }
        };
        match self.chain.overwrite_block(self.cursor as u64, edit) {
            Ok(block) => {
                self.status = Some(format!(
                    "Overwrote {} of block #{}",
                    self.edit_field.label(),
                    block.index()
                ))
            }
            Err(e) => self.status = Some(e.to_string()),
        }
        self.refresh_validation();
    }

    pub fn update_hash_demo(&mut self) {
        self.hash_output = hash::sha256_hex(&self.hash_input);
        self.hash_leading_zeros = hash::leading_zero_chars(&self.hash_output);
    }

    /// Housekeeping run once per event-loop turn.
    pub fn tick(&mut self) {
        if let MiningStatus::Mined { at, .. } = self.mine_status {
            if at.elapsed() >= MINED_STATUS_TTL {
                self.mine_status = MiningStatus::Idle;
            }
        }
    }
}
