use crate::score::Score;

pub const EXACT_SCORE_POINTS: u32 = 5;
pub const OUTCOME_POINTS: u32 = 3;

pub fn score(prediction: Option<&Score>, result: Option<&Score>) -> u32 {
    let (Some(prediction), Some(result)) = (prediction, result) else {
        return 0;
    };
    if prediction == result {
        return EXACT_SCORE_POINTS;
    }
    if prediction.outcome() == result.outcome() {
        return OUTCOME_POINTS;
    }
    0
}
