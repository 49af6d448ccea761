//! Request-scoped unit of work.

use crate::error::AppError;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

/// One transaction per request.
///
/// [`RequestSession::finish`] commits when the service call succeeded and rolls
/// back otherwise. A session dropped without `finish` (early return, panic,
/// cancelled request) is rolled back by sqlx.
pub struct RequestSession {
    tx: Transaction<'static, Postgres>,
}

impl RequestSession {
    pub async fn begin(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let tx = pool.begin().await?;
        Ok(RequestSession { tx })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn finish<T, E>(self, result: &Result<T, E>) -> Result<(), sqlx::Error> {
        match result {
            Ok(_) => self.tx.commit().await,
            Err(_) => {
                tracing::debug!("rolling back request session");
                self.tx.rollback().await
            }
        }
    }

    /// Finish the session and hand back the service outcome as a handler result.
    pub async fn close<T, E>(self, result: Result<T, E>) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        let finished = self.finish(&result).await;
        settle(result, finished)
    }
}

/// A failed commit loses the work, so it wins over `Ok`. A failed rollback
/// changes nothing the client sees: the service error is still the answer.
fn settle<T, E>(result: Result<T, E>, finished: Result<(), sqlx::Error>) -> Result<T, AppError>
where
    AppError: From<E>,
{
    match (result, finished) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(AppError::Db(err)),
        (Err(err), Ok(())) => Err(AppError::from(err)),
        (Err(err), Err(rollback)) => {
            tracing::error!(error = %rollback, "request session rollback failed");
            Err(AppError::from(err))
        }
    }
}
