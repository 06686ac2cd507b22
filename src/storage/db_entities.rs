//! SeaORM entity models used by the database storage backend.
//!
//! Table and column names follow the FreeRADIUS SQL schema so the store can be
//! shared with an existing RADIUS deployment:
//! - `radacct`: one row per session attempt
//! - `nas`: known access servers
//! - `radcheck`: credentials, read only to count distinct usernames

/// Accounting records.
pub mod radacct {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "radacct")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub radacctid: i64,
        /// NAS-assigned Acct-Session-Id
        pub acctsessionid: String,
        #[sea_orm(unique)]
        pub acctuniqueid: String,
        pub username: Option<String>,
        pub nasipaddress: String,
        pub acctstarttime: Option<DateTimeUtc>,
        pub acctupdatetime: Option<DateTimeUtc>,
        /// NULL while the session is open
        pub acctstoptime: Option<DateTimeUtc>,
        pub acctsessiontime: Option<i64>,
        pub acctinputoctets: Option<i64>,
        pub acctoutputoctets: Option<i64>,
        pub calledstationid: Option<String>,
        pub callingstationid: Option<String>,
        pub acctterminatecause: Option<String>,
        pub framedipaddress: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Access server registry.
pub mod nas {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "nas")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        /// IP address or DNS name of the NAS
        pub nasname: String,
        pub shortname: Option<String>,
        #[sea_orm(column_name = "type")]
        pub nas_type: Option<String>,
        pub ports: Option<i32>,
        pub secret: String,
        pub server: Option<String>,
        pub community: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Credential check items.
pub mod radcheck {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "radcheck")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub username: String,
        pub attribute: String,
        pub op: String,
        pub value: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
