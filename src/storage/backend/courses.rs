//! 选课记录

use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::OnConflict,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::model_to_course;
use crate::errors::Result;
use crate::storage::models::Course;

use migration::entities::course;

impl SeaOrmStorage {
    /// 用户的选课记录，最近的年份在前
    pub async fn courses_of(&self, z_id: &str) -> Result<Vec<Course>> {
        let db = &self.db;
        let models = self
            .read("courses_of", || async {
                course::Entity::find()
                    .filter(course::Column::User.eq(z_id))
                    .order_by_desc(course::Column::Year)
                    .order_by_asc(course::Column::Semester)
                    .order_by_asc(course::Column::Code)
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_course).collect())
    }

    /// 选课；同一开课已存在时返回 false
    pub async fn add_course(&self, enrolment: &Course) -> Result<bool> {
        use sea_orm::ActiveValue::{NotSet, Set};

        let inserted = course::Entity::insert(course::ActiveModel {
            id: NotSet,
            user: Set(enrolment.user.clone()),
            code: Set(enrolment.code.clone()),
            year: Set(enrolment.year),
            semester: Set(enrolment.semester.clone()),
        })
        .on_conflict(
            OnConflict::columns([
                course::Column::User,
                course::Column::Code,
                course::Column::Year,
                course::Column::Semester,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;

        if inserted > 0 {
            info!(
                "{} enrolled in {} {} {}",
                enrolment.user, enrolment.code, enrolment.year, enrolment.semester
            );
        }
        Ok(inserted > 0)
    }

    /// 删除 `z_id` 在 `code` 下的所有选课记录，返回删除行数
    pub async fn remove_course(&self, z_id: &str, code: &str) -> Result<u64> {
        let removed = course::Entity::delete_many()
            .filter(course::Column::User.eq(z_id))
            .filter(course::Column::Code.eq(code))
            .exec(&self.db)
            .await?
            .rows_affected;
        Ok(removed)
    }

    /// 其他用户在 `z_id` 修过的课程代码下的选课记录
    pub async fn classmate_rows(&self, z_id: &str) -> Result<Vec<Course>> {
        let codes: Vec<String> = {
            let db = &self.db;
            self.read("course_codes_of", || async {
                course::Entity::find()
                    .select_only()
                    .column(course::Column::Code)
                    .distinct()
                    .filter(course::Column::User.eq(z_id))
                    .into_tuple::<String>()
                    .all(db)
                    .await
            })
            .await?
        };
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let db = &self.db;
        let models = self
            .read("classmate_rows", || async {
                course::Entity::find()
                    .filter(course::Column::Code.is_in(codes.iter().cloned()))
                    .filter(course::Column::User.ne(z_id))
                    .all(db)
                    .await
            })
            .await?;
        Ok(models.into_iter().map(model_to_course).collect())
    }
}
