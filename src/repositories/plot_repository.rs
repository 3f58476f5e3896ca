use super::{map_write_error, RepositoryError, RepositoryResult};
use crate::geometry;
use crate::models::plot::{Plot, PlotDraft, PlotRow};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PlotRepository: Send + Sync {
    async fn list(&self) -> RepositoryResult<Vec<Plot>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Plot>>;
    async fn plot_number_exists(&self, plot_number: &str) -> RepositoryResult<bool>;
    async fn create(&self, draft: &PlotDraft, image_path: Option<String>)
        -> RepositoryResult<Plot>;
    /// Overwrites every field. `image_path` of `None` keeps the stored value.
    async fn update(
        &self,
        id: i64,
        draft: &PlotDraft,
        image_path: Option<String>,
    ) -> RepositoryResult<Plot>;
    /// Returns the plot number of the deleted row.
    async fn delete(&self, id: i64) -> RepositoryResult<String>;
}

pub struct SqlitePlotRepository {
    pool: SqlitePool,
}

impl SqlitePlotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlotRepository for SqlitePlotRepository {
    async fn list(&self) -> RepositoryResult<Vec<Plot>> {
        let rows = sqlx::query_as::<_, PlotRow>(
            r#"
            SELECT id, plot_number, owner_name, address, area_sqm, compliance_status,
                   image_path, land_use, development_status, additional_info, geom
            FROM plots
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Plot::try_from(row).map_err(RepositoryError::from))
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Plot>> {
        let row = sqlx::query_as::<_, PlotRow>(
            r#"
            SELECT id, plot_number, owner_name, address, area_sqm, compliance_status,
                   image_path, land_use, development_status, additional_info, geom
            FROM plots
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Plot::try_from).transpose()?)
    }

    async fn plot_number_exists(&self, plot_number: &str) -> RepositoryResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM plots WHERE plot_number = ?")
            .bind(plot_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn create(
        &self,
        draft: &PlotDraft,
        image_path: Option<String>,
    ) -> RepositoryResult<Plot> {
        let result = sqlx::query(
            r#"
            INSERT INTO plots (plot_number, owner_name, address, area_sqm, compliance_status,
                               image_path, land_use, development_status, additional_info, geom)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.plot_number)
        .bind(&draft.owner_name)
        .bind(&draft.address)
        .bind(draft.area_sqm)
        .bind(&draft.compliance_status)
        .bind(image_path)
        .bind(&draft.land_use)
        .bind(&draft.development_status)
        .bind(&draft.additional_info)
        .bind(geometry::to_ewkt(&draft.geom))
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn update(
        &self,
        id: i64,
        draft: &PlotDraft,
        image_path: Option<String>,
    ) -> RepositoryResult<Plot> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE plots
            SET plot_number = ?,
                owner_name = ?,
                address = ?,
                area_sqm = ?,
                compliance_status = ?,
                image_path = COALESCE(?, image_path),
                land_use = ?,
                development_status = ?,
                additional_info = ?,
                geom = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.plot_number)
        .bind(&draft.owner_name)
        .bind(&draft.address)
        .bind(draft.area_sqm)
        .bind(&draft.compliance_status)
        .bind(image_path)
        .bind(&draft.land_use)
        .bind(&draft.development_status)
        .bind(&draft.additional_info)
        .bind(geometry::to_ewkt(&draft.geom))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, PlotRow>(
            r#"
            SELECT id, plot_number, owner_name, address, area_sqm, compliance_status,
                   image_path, land_use, development_status, additional_info, geom
            FROM plots
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Plot::try_from(row)?)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<String> {
        let plot_number: Option<String> =
            sqlx::query_scalar("DELETE FROM plots WHERE id = ? RETURNING plot_number")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        plot_number.ok_or(RepositoryError::NotFound)
    }
}
