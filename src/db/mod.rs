use anyhow::Result;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub mod models;
use models::*;

/// Thread-safe SQLite connection (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// In-memory database for tests
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Game results ──────────────────────────────────────────────────────────

    /// Append game records (one row per side of each final game)
    pub fn insert_game_records(&self, records: &[GameRecord]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO game_results (team, opponent, result) VALUES (?1, ?2, ?3)",
            )?;
            for rec in records {
                stmt.execute(params![rec.team, rec.opponent, rec.result.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Load every stored game record
    pub fn load_game_records(&self) -> Result<Vec<GameRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT team, opponent, result FROM game_results ORDER BY id")?;
        let records = stmt
            .query_map([], map_game_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Number of stored game records
    pub fn game_count(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM game_results", [], |r| r.get(0))?;
        Ok(count)
    }

    /// Drop all stored game records (before re-fetching a season)
    pub fn clear_game_records(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM game_results", [])?;
        Ok(())
    }

    // ── Team stats ────────────────────────────────────────────────────────────

    /// Replace the team stats table with a freshly computed set
    pub fn replace_team_stats(&self, stats: &[TeamStats]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM team_stats", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO team_stats (team, wp, owp, oowp, rpi, win_prob_vs_reference)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for s in stats {
                stmt.execute(params![
                    s.team,
                    s.wp,
                    s.owp,
                    s.oowp,
                    s.rpi,
                    s.win_prob_vs_reference,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load team stats ordered by RPI, best first
    pub fn load_team_stats(&self) -> Result<Vec<TeamStats>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT team, wp, owp, oowp, rpi, win_prob_vs_reference
             FROM team_stats ORDER BY rpi DESC, team",
        )?;
        let stats = stmt
            .query_map([], map_team_stats)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stats)
    }

    // ── Rankings ──────────────────────────────────────────────────────────────

    /// Replace the cleaned rankings table
    pub fn replace_rankings(&self, rows: &[RankingRow]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM rankings", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rankings (team, rpi_ranking, elo) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                stmt.execute(params![row.team, row.rpi_ranking, row.elo])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the cleaned rankings table
    pub fn load_rankings(&self) -> Result<Vec<RankingRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT team, rpi_ranking, elo FROM rankings ORDER BY rpi_ranking")?;
        let rows = stmt
            .query_map([], map_ranking_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_game_record(row: &rusqlite::Row) -> rusqlite::Result<GameRecord> {
    let result_str: String = row.get(2)?;
    let result = GameOutcome::from_str(&result_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("invalid game result '{result_str}'").into(),
        )
    })?;
    Ok(GameRecord {
        team: row.get(0)?,
        opponent: row.get(1)?,
        result,
    })
}

fn map_team_stats(row: &rusqlite::Row) -> rusqlite::Result<TeamStats> {
    Ok(TeamStats {
        team: row.get(0)?,
        wp: row.get(1)?,
        owp: row.get(2)?,
        oowp: row.get(3)?,
        rpi: row.get(4)?,
        win_prob_vs_reference: row.get(5)?,
    })
}

fn map_ranking_row(row: &rusqlite::Row) -> rusqlite::Result<RankingRow> {
    Ok(RankingRow {
        team: row.get(0)?,
        rpi_ranking: row.get(1)?,
        elo: row.get(2)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS game_results (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    team     TEXT    NOT NULL,
    opponent TEXT    NOT NULL,
    result   TEXT    NOT NULL CHECK (result IN ('W', 'L'))
);

CREATE TABLE IF NOT EXISTS team_stats (
    team                  TEXT PRIMARY KEY,
    wp                    REAL NOT NULL,
    owp                   REAL NOT NULL,
    oowp                  REAL NOT NULL,
    rpi                   REAL NOT NULL,
    win_prob_vs_reference REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS rankings (
    team        TEXT PRIMARY KEY,
    rpi_ranking REAL NOT NULL,
    elo         REAL
);

CREATE INDEX IF NOT EXISTS idx_game_results_team ON game_results(team);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(team: &str, opponent: &str, result: GameOutcome) -> GameRecord {
        GameRecord {
            team: team.into(),
            opponent: opponent.into(),
            result,
        }
    }

    #[test]
    fn test_game_records_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let records = vec![
            record("Georgia Tech", "Clemson", GameOutcome::Win),
            record("Clemson", "Georgia Tech", GameOutcome::Loss),
        ];
        db.insert_game_records(&records).unwrap();
        assert_eq!(db.game_count().unwrap(), 2);
        assert_eq!(db.load_game_records().unwrap(), records);

        db.clear_game_records().unwrap();
        assert_eq!(db.game_count().unwrap(), 0);
    }

    #[test]
    fn test_team_stats_replace_orders_by_rpi() {
        let db = Database::open_in_memory().unwrap();
        let stats = vec![
            TeamStats {
                team: "Duke".into(),
                wp: 0.4,
                owp: 0.5,
                oowp: 0.5,
                rpi: 0.475,
                win_prob_vs_reference: 0.55,
            },
            TeamStats {
                team: "Oklahoma".into(),
                wp: 0.9,
                owp: 0.6,
                oowp: 0.55,
                rpi: 0.6625,
                win_prob_vs_reference: 0.12,
            },
        ];
        db.replace_team_stats(&stats).unwrap();
        let loaded = db.load_team_stats().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].team, "Oklahoma");

        // Replace fully supersedes the previous contents
        db.replace_team_stats(&stats[..1]).unwrap();
        assert_eq!(db.load_team_stats().unwrap().len(), 1);
    }

    #[test]
    fn test_rankings_nullable_elo() {
        let db = Database::open_in_memory().unwrap();
        let rows = vec![
            RankingRow {
                team: "UCLA".into(),
                rpi_ranking: 3.0,
                elo: Some(1712.5),
            },
            RankingRow {
                team: "Mercer".into(),
                rpi_ranking: 140.0,
                elo: None,
            },
        ];
        db.replace_rankings(&rows).unwrap();
        let loaded = db.load_rankings().unwrap();
        assert_eq!(loaded, rows);
    }
}
