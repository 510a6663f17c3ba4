use rusqlite::{Connection, Result, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Cumulative win counter and game history.
pub struct Stats {
    conn: Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Philosophy,
    Race,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Philosophy => "philosophy",
            GameMode::Race => "race",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "philosophy" => Some(GameMode::Philosophy),
            "race" => Some(GameMode::Race),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub mode: GameMode,
    pub start: String,
    pub end: Option<String>,
    pub outcome: String,
    pub steps: usize,
    pub finished_at: i64,
}

impl GameRecord {
    pub fn new(mode: GameMode, start: &str, end: Option<&str>, outcome: &str, steps: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mode,
            start: start.to_string(),
            end: end.map(str::to_string),
            outcome: outcome.to_string(),
            steps,
            finished_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_win(&self) -> bool {
        self.outcome == "won"
    }
}

impl Stats {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let stats = Stats { conn };
        stats.init_schema()?;
        Ok(stats)
    }

    pub fn in_memory() -> Result<Self> {
        let stats = Stats {
            conn: Connection::open_in_memory()?,
        };
        stats.init_schema()?;
        Ok(stats)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL CHECK(value >= 0)
            );

            INSERT OR IGNORE INTO counters (name, value) VALUES ('wins', 0);

            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                mode TEXT NOT NULL CHECK(mode IN ('philosophy', 'race')),
                start_page TEXT NOT NULL,
                end_page TEXT,
                outcome TEXT NOT NULL,
                steps INTEGER NOT NULL,
                finished_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_finished ON games(finished_at);
            ",
        )
    }

    pub fn wins(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT value FROM counters WHERE name = 'wins'", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|v| v as u64)
    }

    /// Store a finished game and bump the win counter if it was won.
    ///
    /// Returns the cumulative wins after recording.
    pub fn record_game(&mut self, game: &GameRecord) -> Result<u64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO games (id, mode, start_page, end_page, outcome, steps, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                game.id,
                game.mode.as_str(),
                game.start,
                game.end,
                game.outcome,
                game.steps as i64,
                game.finished_at,
            ],
        )?;
        if game.is_win() {
            tx.execute("UPDATE counters SET value = value + 1 WHERE name = 'wins'", [])?;
        }
        tx.commit()?;

        self.wins()
    }

    pub fn game_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get::<_, i64>(0))
            .map(|v| v as u64)
    }

    /// Most recent games first.
    pub fn recent_games(&self, limit: usize) -> Result<Vec<GameRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, start_page, end_page, outcome, steps, finished_at
             FROM games ORDER BY finished_at DESC, rowid DESC LIMIT ?1",
        )?;

        let games = stmt
            .query_map(params![limit as i64], |row| {
                let mode: String = row.get(1)?;
                Ok(GameRecord {
                    id: row.get(0)?,
                    mode: GameMode::parse(&mode).unwrap_or(GameMode::Philosophy),
                    start: row.get(2)?,
                    end: row.get(3)?,
                    outcome: row.get(4)?,
                    steps: row.get::<_, i64>(5)? as usize,
                    finished_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(games)
    }
}
