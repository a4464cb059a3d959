use crate::domain::model::{Connection, Entity};

/// 實體的讀取端：實體本身與它所參照的連線
#[derive(Debug, Clone, PartialEq)]
pub struct InputContext {
    pub entity: Entity,
    pub connection: Connection,
}

/// 實體的寫入端：連線為流程層級的輸出連線，而非實體自己的連線
#[derive(Debug, Clone, PartialEq)]
pub struct OutputContext {
    pub entity: Entity,
    pub connection: Connection,
}

impl OutputContext {
    pub fn database(&self) -> &str {
        &self.connection.database
    }

    pub fn table(&self) -> &str {
        self.entity.table_name()
    }
}
