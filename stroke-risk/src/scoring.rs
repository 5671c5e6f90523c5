//! Stroke risk scoring engine
//!
//! Additive point scale over six risk factors, capped at 100:
//!
//! | Rule | Points |
//! |---|---|
//! | age > 50 | 10 |
//! | age > 70 (on top of the above) | 20 |
//! | hypertension | 30 |
//! | heart disease | 20 |
//! | glucose > 200, else glucose > 140 | 20 / 10 |
//! | bmi > 30 | 10 |
//! | smokes, else formerly smoked | 15 / 5 |
//!
//! Age bands accumulate; glucose and smoking bands are exclusive.

use crate::{FactorContribution, RiskAssessment, RiskFactors, RiskLevel, RiskScore, SmokingStatus};

/// Risk scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    /// Create new risk scorer
    pub fn new() -> Self {
        Self
    }

    /// Numeric score for the given factors
    pub fn score(&self, factors: &RiskFactors) -> RiskScore {
        let total = contributions(factors)
            .iter()
            .map(|(_, points)| u32::from(*points))
            .sum::<u32>();
        RiskScore::new(total.min(u32::from(RiskScore::MAX)) as u8)
    }

    /// Risk label for the given factors
    pub fn level(&self, factors: &RiskFactors) -> RiskLevel {
        RiskLevel::from(self.score(factors))
    }

    /// Full assessment including the rules that fired
    pub fn assess(&self, factors: &RiskFactors) -> RiskAssessment {
        let risk_score = self.score(factors);
        RiskAssessment {
            risk_score,
            risk_level: RiskLevel::from(risk_score),
            contributions: contributions(factors)
                .into_iter()
                .map(|(name, points)| FactorContribution {
                    name: name.to_string(),
                    points,
                })
                .collect(),
        }
    }
}

/// Score six risk factors into a risk label
pub fn score_risk(
    age: f64,
    hypertension: bool,
    heart_disease: bool,
    avg_glucose_level: f64,
    bmi: f64,
    smoking_status: SmokingStatus,
) -> RiskLevel {
    RiskScorer::new().level(&RiskFactors {
        age,
        hypertension,
        heart_disease,
        avg_glucose_level,
        bmi,
        smoking_status,
    })
}

fn contributions(factors: &RiskFactors) -> Vec<(&'static str, u8)> {
    let mut fired = Vec::with_capacity(7);

    if factors.age > 50.0 {
        fired.push(("Age over 50", 10));
    }
    if factors.age > 70.0 {
        fired.push(("Age over 70", 20));
    }

    if factors.hypertension {
        fired.push(("Hypertension", 30));
    }
    if factors.heart_disease {
        fired.push(("Heart disease", 20));
    }

    if factors.avg_glucose_level > 200.0 {
        fired.push(("Glucose over 200", 20));
    } else if factors.avg_glucose_level > 140.0 {
        fired.push(("Glucose over 140", 10));
    }

    if factors.bmi > 30.0 {
        fired.push(("BMI over 30", 10));
    }

    match factors.smoking_status {
        SmokingStatus::Smokes => fired.push(("Smokes", 15)),
        SmokingStatus::FormerlySmoked => fired.push(("Formerly smoked", 5)),
        SmokingStatus::NeverSmoked | SmokingStatus::Unknown => {}
    }

    fired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(
        age: f64,
        hypertension: bool,
        heart_disease: bool,
        avg_glucose_level: f64,
        bmi: f64,
        smoking_status: SmokingStatus,
    ) -> RiskFactors {
        RiskFactors {
            age,
            hypertension,
            heart_disease,
            avg_glucose_level,
            bmi,
            smoking_status,
        }
    }

    #[test]
    fn test_everything_fires_and_caps() {
        let scorer = RiskScorer::new();
        let f = factors(75.0, true, true, 220.0, 35.0, SmokingStatus::Smokes);

        assert_eq!(scorer.score(&f).score(), 100);
        assert_eq!(scorer.level(&f), RiskLevel::High);
        assert_eq!(
            score_risk(75.0, true, true, 220.0, 35.0, SmokingStatus::Smokes),
            RiskLevel::High
        );

        let uncapped: u32 = scorer
            .assess(&f)
            .contributions
            .iter()
            .map(|c| u32::from(c.points))
            .sum();
        assert_eq!(uncapped, 125);
    }

    #[test]
    fn test_healthy_young_patient() {
        assert_eq!(
            score_risk(25.0, false, false, 85.0, 22.0, SmokingStatus::NeverSmoked),
            RiskLevel::Low
        );
        let f = factors(25.0, false, false, 85.0, 22.0, SmokingStatus::NeverSmoked);
        assert_eq!(RiskScorer::new().score(&f).score(), 0);
    }

    #[test]
    fn test_just_over_fifty() {
        let f = factors(51.0, false, false, 0.0, 0.0, SmokingStatus::Unknown);
        assert_eq!(RiskScorer::new().score(&f).score(), 10);
        assert_eq!(score_risk(51.0, false, false, 0.0, 0.0, SmokingStatus::Unknown), RiskLevel::Low);
    }

    #[test]
    fn test_age_fifty_exactly_scores_nothing() {
        let f = factors(50.0, false, false, 0.0, 0.0, SmokingStatus::Unknown);
        assert_eq!(RiskScorer::new().score(&f).score(), 0);
    }

    #[test]
    fn test_age_bands_accumulate() {
        let f = factors(71.0, false, false, 0.0, 0.0, SmokingStatus::Unknown);
        let assessment = RiskScorer::new().assess(&f);
        assert_eq!(assessment.risk_score.score(), 30);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.contributions.len(), 2);
        assert_eq!(
            score_risk(71.0, false, false, 0.0, 0.0, SmokingStatus::Unknown),
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_glucose_bands_are_exclusive() {
        let f = factors(60.0, false, false, 150.0, 0.0, SmokingStatus::Unknown);
        assert_eq!(RiskScorer::new().score(&f).score(), 20);
        assert_eq!(RiskScorer::new().level(&f), RiskLevel::Low);
        assert_eq!(
            score_risk(60.0, false, false, 150.0, 0.0, SmokingStatus::Unknown),
            RiskLevel::Low
        );

        let f = factors(0.0, false, false, 201.0, 0.0, SmokingStatus::Unknown);
        assert_eq!(RiskScorer::new().score(&f).score(), 20);

        let f = factors(0.0, false, false, 140.0, 0.0, SmokingStatus::Unknown);
        assert_eq!(RiskScorer::new().score(&f).score(), 0);
    }

    #[test]
    fn test_medium_lower_boundary() {
        let f = factors(60.0, true, false, 0.0, 0.0, SmokingStatus::Unknown);
        assert_eq!(RiskScorer::new().score(&f).score(), 40);
        assert_eq!(
            score_risk(60.0, true, false, 0.0, 0.0, SmokingStatus::Unknown),
            RiskLevel::Medium
        );
    }

    #[test]
    fn test_smoking_bands() {
        let scorer = RiskScorer::new();
        let score = |s| scorer.score(&factors(0.0, false, false, 0.0, 0.0, s)).score();

        assert_eq!(score(SmokingStatus::Smokes), 15);
        assert_eq!(score(SmokingStatus::FormerlySmoked), 5);
        assert_eq!(score(SmokingStatus::NeverSmoked), 0);
        assert_eq!(score(SmokingStatus::Unknown), 0);
    }

    #[test]
    fn test_high_threshold() {
        // hypertension + heart disease + bmi = 60
        let f = factors(30.0, true, true, 90.0, 31.0, SmokingStatus::NeverSmoked);
        let assessment = RiskScorer::new().assess(&f);
        assert_eq!(assessment.risk_score.score(), 60);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        let names: Vec<_> = assessment.contributions.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Hypertension", "Heart disease", "BMI over 30"]);
    }
}
