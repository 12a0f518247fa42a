//! 探索
//!
//! - `searcher`: 反復深化・aspiration window・PVS・静止探索
//! - `movepicker`: 段階的な指し手生成と並べ替え
//! - `history`: Historyの成功率
//! - `node`: ノードスタック・探索フラグ・読み筋
//! - `params`: 延長・枝刈り・LMRの定数と表
//! - `time_manager`: 時間管理
//! - `config` / `handler` / `info`: 設定・進捗通知・統計と結果

mod config;
mod handler;
mod history;
mod info;
mod movepicker;
mod node;
mod params;
mod searcher;
mod time_manager;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, SearchConfig};
pub use handler::{LoggingSearchHandler, NullSearchHandler, SearchHandler, SearchProgress};
pub use history::History;
pub use info::{SearchInfo, SearchResult};
pub use node::{NodeStat, Pv};
pub use searcher::Searcher;
