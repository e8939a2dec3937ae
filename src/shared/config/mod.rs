/// 設定モジュール
///
/// 環境変数からの設定読み込みとログシステムの初期化を提供します。
pub mod environment;

pub use environment::{
    initialize_logging_system, load_environment_variables, EnvironmentConfig, ServiceConfig,
};
