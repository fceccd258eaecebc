//! Persistent fishing statistics.
//!
//! Sessions and individual catches are kept in a single JSON document next to
//! the application. Every mutation rewrites the document through a temp file so
//! a crash never leaves a half-written store behind.

use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::{Path, PathBuf},
	time::Duration,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatchKind {
	Fish,
	Fruit,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionRecord {
	pub id: u64,
	pub start_time: DateTime<Local>,
	pub end_time: Option<DateTime<Local>>,
	pub fish_count: u64,
	pub fruit_count: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatchRecord {
	pub session_id: u64,
	#[serde(rename = "type")]
	pub kind: CatchKind,
	pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Document {
	sessions: Vec<SessionRecord>,
	catches: Vec<CatchRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
	pub date: NaiveDate,
	pub sessions: u64,
	pub fish: u64,
	pub fruits: u64,
}

#[derive(Debug)]
pub struct StatsStore {
	path: PathBuf,
	doc: Document,
	current: Option<u64>,
	fish_count: u64,
	fruit_count: u64,
}

impl StatsStore {
	/// Open (or create) the store at `path`.
	///
	/// A corrupt document is moved aside to `<name>.bak` and a fresh store is started.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let doc = match Self::load(&path) {
			Ok(doc) => doc,
			Err(err) if path.exists() => {
				let backup = path.with_extension("json.bak");
				tracing::warn!(error = %err, backup = %backup.display(), "stats store unreadable; starting fresh");
				std::fs::rename(&path, &backup).with_context(|| format!("Move aside {}", path.display()))?;
				Document::default()
			}
			Err(_) => Document::default(),
		};

		let store = Self {
			path,
			doc,
			current: None,
			fish_count: 0,
			fruit_count: 0,
		};
		store.save()?;
		Ok(store)
	}

	fn load(path: &Path) -> Result<Document> {
		let file = File::open(path).with_context(|| format!("Open stats {}", path.display()))?;
		let reader = BufReader::new(file);
		serde_json::from_reader(reader).with_context(|| format!("Parse stats {}", path.display()))
	}

	fn save(&self) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent).with_context(|| format!("Create stats dir {}", parent.display()))?;
		}

		let tmp = self.path.with_extension("json.tmp");
		let file = File::create(&tmp).with_context(|| format!("Write stats temp {}", tmp.display()))?;
		let mut writer = BufWriter::new(file);
		serde_json::to_writer_pretty(&mut writer, &self.doc).context("Serialize stats")?;
		writer.flush().context("Flush stats")?;
		drop(writer);

		// Replace existing file (Windows-friendly).
		if std::fs::rename(&tmp, &self.path).is_err() {
			let _ = std::fs::remove_file(&self.path);
			std::fs::rename(&tmp, &self.path).with_context(|| format!("Persist stats {}", self.path.display()))?;
		}
		Ok(())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Begin a new session and reset the live counters.
	pub fn start_session(&mut self) -> Result<u64> {
		let id = self.doc.sessions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
		self.doc.sessions.push(SessionRecord {
			id,
			start_time: Local::now(),
			end_time: None,
			fish_count: 0,
			fruit_count: 0,
		});
		self.current = Some(id);
		self.fish_count = 0;
		self.fruit_count = 0;
		self.save()?;
		tracing::info!(session = id, "stats session started");
		Ok(id)
	}

	/// Close the current session with the live totals. No-op without a session.
	pub fn end_session(&mut self) -> Result<()> {
		let Some(id) = self.current.take() else {
			return Ok(());
		};
		let (fish, fruits) = (self.fish_count, self.fruit_count);
		if let Some(session) = self.doc.sessions.iter_mut().find(|s| s.id == id) {
			let end = Local::now();
			session.end_time = Some(end);
			session.fish_count = fish;
			session.fruit_count = fruits;
			tracing::info!(
				session = id,
				fish,
				fruits,
				duration_s = (end - session.start_time).num_seconds(),
				"stats session ended"
			);
		}
		self.save()
	}

	pub fn log_fish(&mut self) -> Result<()> {
		self.fish_count += 1;
		self.log_catch(CatchKind::Fish)
	}

	pub fn log_fruit(&mut self) -> Result<()> {
		self.fruit_count += 1;
		self.log_catch(CatchKind::Fruit)
	}

	fn log_catch(&mut self, kind: CatchKind) -> Result<()> {
		let Some(session_id) = self.current else {
			return Ok(());
		};
		self.doc.catches.push(CatchRecord {
			session_id,
			kind,
			timestamp: Local::now(),
		});
		// Keep the open session's totals current so a crash loses nothing.
		let (fish, fruits) = (self.fish_count, self.fruit_count);
		if let Some(session) = self.doc.sessions.iter_mut().find(|s| s.id == session_id) {
			session.fish_count = fish;
			session.fruit_count = fruits;
		}
		self.save()
	}

	pub fn fish_count(&self) -> u64 {
		self.fish_count
	}

	pub fn fruit_count(&self) -> u64 {
		self.fruit_count
	}

	pub fn current_session(&self) -> Option<u64> {
		self.current
	}

	pub fn sessions(&self) -> &[SessionRecord] {
		&self.doc.sessions
	}

	pub fn catches(&self) -> &[CatchRecord] {
		&self.doc.catches
	}

	pub fn session_duration(&self) -> Duration {
		self.current
			.and_then(|id| self.doc.sessions.iter().find(|s| s.id == id))
			.and_then(|s| (Local::now() - s.start_time).to_std().ok())
			.unwrap_or_default()
	}

	/// Totals for sessions started on `date` (local time).
	pub fn summary_for(&self, date: NaiveDate) -> DaySummary {
		self.doc
			.sessions
			.iter()
			.filter(|s| s.start_time.date_naive() == date)
			.fold(
				DaySummary {
					date,
					sessions: 0,
					fish: 0,
					fruits: 0,
				},
				|mut acc, s| {
					acc.sessions += 1;
					acc.fish += s.fish_count;
					acc.fruits += s.fruit_count;
					acc
				},
			)
	}

	pub fn today_summary(&self) -> DaySummary {
		self.summary_for(Local::now().date_naive())
	}

	/// One summary per day for the last `days` days, newest first.
	pub fn historical(&self, days: u32) -> Vec<DaySummary> {
		self.historical_from(Local::now().date_naive(), days)
	}

	pub fn historical_from(&self, today: NaiveDate, days: u32) -> Vec<DaySummary> {
		(0..days as u64)
			.filter_map(|back| today.checked_sub_days(chrono::Days::new(back)))
			.map(|date| self.summary_for(date))
			.collect()
	}

	/// Write every session to a CSV file, newest first.
	pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
		let path = path.as_ref();
		let mut sessions = self.doc.sessions.iter().collect::<Vec<_>>();
		sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));

		let file = File::create(path).with_context(|| format!("Create {}", path.display()))?;
		let mut writer = BufWriter::new(file);
		writeln!(writer, "id,start_time,end_time,fish_count,fruit_count")?;
		for s in &sessions {
			writeln!(
				writer,
				"{},{},{},{},{}",
				s.id,
				s.start_time.to_rfc3339(),
				s.end_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
				s.fish_count,
				s.fruit_count
			)?;
		}
		writer.flush().context("Flush csv")?;
		tracing::info!(rows = sessions.len(), path = %path.display(), "exported sessions");
		Ok(sessions.len())
	}
}

impl Drop for StatsStore {
	fn drop(&mut self) {
		if let Err(err) = self.end_session() {
			tracing::warn!(error = %err, "failed to close stats session");
		}
	}
}
