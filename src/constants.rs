//! 游戏数值与规则常量，引擎、计分与存档共用。

pub const HAND_SIZE: usize = 5;
pub const BASE_PRODUCTIVITY_POINTS: i32 = 20;

pub const MAX_PROGRESS: i32 = 100;
pub const MAX_TECHNICAL_DEBT: i32 = 20;
pub const TECHNICAL_DEBT_REDUCTION: i32 = 2;

pub const SAVE_VERSION: &str = "1.0.0";

// 计分：三个分量各自线性插值并截断到 [0, cap]。
pub const ROUNDS_SCORE_CAP: f64 = 700.0;
pub const ROUNDS_FULL_SCORE: u32 = 10;
pub const ROUNDS_ZERO_SCORE: u32 = 50;

pub const CARDS_SCORE_CAP: f64 = 200.0;
pub const CARDS_FULL_SCORE: u32 = 10;
pub const CARDS_ZERO_SCORE: u32 = 25;

pub const TIME_SCORE_CAP: f64 = 100.0;
pub const TIME_FULL_SCORE_SECS: f64 = 30.0;
pub const TIME_ZERO_SCORE_SECS: f64 = 300.0;

pub const MAX_SCORE: u32 = 1000;
