use crate::entities::prelude::*;
use crate::entities::{accreditation_stats, indicators, users};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the bootstrap admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(AuthTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(VisitorSessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(VisitorStats)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(ActivityLogs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(Indicators)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(AccreditationStats)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(Documents)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();

        // Bootstrap admin account; the password must be rotated after first login.
        let password_hash = hash_default_password();
        let insert_admin = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                users::Column::Name,
                users::Column::Username,
                users::Column::Email,
                users::Column::Role,
                users::Column::PasswordHash,
                users::Column::CreatedAt,
                users::Column::UpdatedAt,
            ])
            .values_panic([
                "Administrator".into(),
                "admin".into(),
                "admin@dinkes.local".into(),
                "admin".into(),
                password_hash.into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert_admin).await?;

        let insert_accreditation = sea_orm_migration::sea_query::Query::insert()
            .into_table(AccreditationStats)
            .columns([
                accreditation_stats::Column::Paripurna,
                accreditation_stats::Column::Utama,
                accreditation_stats::Column::Madya,
                accreditation_stats::Column::RecordedAt,
                accreditation_stats::Column::CreatedAt,
                accreditation_stats::Column::UpdatedAt,
            ])
            .values_panic([
                45.into(),
                35.into(),
                20.into(),
                now.clone().into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert_accreditation).await?;

        let seed_indicators: [(&str, f64, f64, &str); 4] = [
            ("Kepatuhan kebersihan tangan", 90.0, 95.0, "Tidak Mencapai Target"),
            ("Kepatuhan penggunaan APD", 96.0, 98.0, "Tidak Mencapai Target"),
            ("Kepatuhan identifikasi pasien", 99.0, 100.0, "Tidak Mencapai Target"),
            ("Waktu tanggap operasi SC emergensi", 89.0, 90.0, "Tidak Mencapai Target"),
        ];

        for (name, capaian, target, status) in seed_indicators {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(Indicators)
                .columns([
                    indicators::Column::Name,
                    indicators::Column::Capaian,
                    indicators::Column::Target,
                    indicators::Column::Status,
                    indicators::Column::CreatedAt,
                    indicators::Column::UpdatedAt,
                ])
                .values_panic([
                    name.into(),
                    capaian.into(),
                    target.into(),
                    status.into(),
                    now.clone().into(),
                    now.clone().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccreditationStats).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Indicators).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityLogs).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VisitorStats).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VisitorSessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
