use super::{RepositoryError, RepositoryResult};
use crate::geometry;
use crate::models::cadastra::{Cadastra, CadastraDraft, CadastraRow};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait CadastraRepository: Send + Sync {
    async fn create(&self, draft: &CadastraDraft) -> RepositoryResult<Cadastra>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Cadastra>>;
    async fn list(&self) -> RepositoryResult<Vec<Cadastra>>;
}

pub struct SqliteCadastraRepository {
    pool: SqlitePool,
}

impl SqliteCadastraRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CadastraRepository for SqliteCadastraRepository {
    async fn create(&self, draft: &CadastraDraft) -> RepositoryResult<Cadastra> {
        let result = sqlx::query(
            r#"
            INSERT INTO cadastra (plot_number, owner_name, address, area_sqm, compliance_status,
                                  land_use, development_status, additional_info, geom,
                                  custom_coordinates)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.plot_number)
        .bind(&draft.owner_name)
        .bind(&draft.address)
        .bind(draft.area_sqm)
        .bind(&draft.compliance_status)
        .bind(&draft.land_use)
        .bind(&draft.development_status)
        .bind(&draft.additional_info)
        .bind(geometry::to_ewkt(&draft.geom))
        .bind(&draft.custom_coordinates)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Cadastra>> {
        let row = sqlx::query_as::<_, CadastraRow>(
            r#"
            SELECT id, plot_number, owner_name, address, area_sqm, compliance_status,
                   land_use, development_status, additional_info, geom, custom_coordinates
            FROM cadastra
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cadastra::try_from).transpose()?)
    }

    async fn list(&self) -> RepositoryResult<Vec<Cadastra>> {
        let rows = sqlx::query_as::<_, CadastraRow>(
            r#"
            SELECT id, plot_number, owner_name, address, area_sqm, compliance_status,
                   land_use, development_status, additional_info, geom, custom_coordinates
            FROM cadastra
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Cadastra::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}
