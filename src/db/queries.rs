use sqlx::{PgPool, Result};

use crate::{game::GroupScore, models::GameResult};

// Game setup queries

/// Raw game record as saved by the game editor
pub async fn get_game_record(pool: &PgPool, game_id: &str) -> Result<Option<serde_json::Value>> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT record FROM games WHERE game_id = $1")
            .bind(game_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(record,)| record))
}

// Quiz pool queries

/// All quiz records owned by `user_id`, as (quiz_id, record) pairs
pub async fn get_quiz_records(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<(String, serde_json::Value)>> {
    sqlx::query_as("SELECT quiz_id, record FROM quizzes WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

// Result queries

/// Record the final score of every group in one transaction
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `game_id` - The finished game
/// * `scores` - Final standings, one row per group
pub async fn save_game_results(pool: &PgPool, game_id: &str, scores: &[GroupScore]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for group in scores {
        sqlx::query(
            r#"
            INSERT INTO game_results (game_id, group_name, score, key_count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (game_id, group_name) DO UPDATE SET
                score = EXCLUDED.score,
                key_count = EXCLUDED.key_count,
                recorded_at = NOW()
            "#,
        )
        .bind(game_id)
        .bind(&group.name)
        .bind(i64::try_from(group.score).unwrap_or(i64::MAX))
        .bind(i32::try_from(group.keys).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn get_game_results(pool: &PgPool, game_id: &str) -> Result<Vec<GameResult>> {
    sqlx::query_as::<_, GameResult>(
        r#"
        SELECT game_id, group_name, score, key_count, recorded_at
        FROM game_results
        WHERE game_id = $1
        ORDER BY score DESC, group_name
        "#,
    )
    .bind(game_id)
    .fetch_all(pool)
    .await
}
