//! Keeps the denormalised bootcamp averages in step with courses and reviews
use futures::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Database;

use crate::error::ErrorResponse;
use crate::models::{BOOTCAMPS, COURSES, REVIEWS};

pub struct AverageService;

/// Mean tuition rounded up to the nearest ten
pub fn round_cost(average: f64) -> f64 {
    (average / 10.0).ceil() * 10.0
}

impl AverageService {
    /// Recompute `average_cost` from the bootcamp's course tuitions
    pub async fn refresh_average_cost(db: &Database, bootcamp: ObjectId) -> Result<(), ErrorResponse> {
        let average = Self::average_of(db, COURSES, bootcamp, "$tuition").await?;
        Self::store(db, bootcamp, "average_cost", average.map(round_cost)).await
    }

    /// Recompute `average_rating` from the bootcamp's reviews
    pub async fn refresh_average_rating(db: &Database, bootcamp: ObjectId) -> Result<(), ErrorResponse> {
        let average = Self::average_of(db, REVIEWS, bootcamp, "$rating").await?;
        Self::store(db, bootcamp, "average_rating", average).await
    }

    async fn average_of(
        db: &Database,
        collection: &str,
        bootcamp: ObjectId,
        field: &str,
    ) -> Result<Option<f64>, ErrorResponse> {
        let pipeline = vec![
            doc! { "$match": { "bootcamp": bootcamp } },
            doc! { "$group": { "_id": "$bootcamp", "average": { "$avg": field } } },
        ];

        let mut cursor = db
            .collection::<Document>(collection)
            .aggregate(pipeline)
            .await?;

        match cursor.next().await {
            Some(group) => Ok(group?.get_f64("average").ok()),
            None => Ok(None),
        }
    }

    async fn store(
        db: &Database,
        bootcamp: ObjectId,
        field: &str,
        value: Option<f64>,
    ) -> Result<(), ErrorResponse> {
        let update = match value {
            Some(v) => doc! { "$set": { field: v } },
            None => doc! { "$unset": { field: "" } },
        };

        db.collection::<Document>(BOOTCAMPS)
            .update_one(doc! { "_id": bootcamp }, update)
            .await?;

        log::debug!("Refreshed {} for bootcamp {}", field, bootcamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cost_rounds_up_to_ten() {
        assert_eq!(round_cost(9000.0), 9000.0);
        assert_eq!(round_cost(9001.0), 9010.0);
        assert_eq!(round_cost(10333.33), 10340.0);
    }
}
