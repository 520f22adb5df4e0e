use crate::framework::DatabaseProcessor;
use aaroh_sdk::objects::CourseResponse;
use kanau::processor::Processor;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: rust_decimal::Decimal,
    pub is_published: bool,
    pub created_at: time::PrimitiveDateTime,
}

impl Course {
    pub fn to_response(&self) -> CourseResponse {
        CourseResponse {
            course_id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            created_at: super::unix_timestamp(self.created_at),
        }
    }
}

#[derive(Debug, Clone)]
/// Get a course by id, published or not.
pub struct GetCourseById {
    pub course_id: Uuid,
}

impl Processor<GetCourseById> for DatabaseProcessor {
    type Output = Option<Course>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCourseById")]
    async fn process(&self, query: GetCourseById) -> Result<Option<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, price, is_published, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(query.course_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// List published courses, newest first.
pub struct ListPublishedCourses;

impl Processor<ListPublishedCourses> for DatabaseProcessor {
    type Output = Vec<Course>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPublishedCourses")]
    async fn process(&self, _query: ListPublishedCourses) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, price, is_published, created_at
            FROM courses
            WHERE is_published = true
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
