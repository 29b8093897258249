use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::errors::{DateError, FlowError};
use crate::models::{Answer, EligibilityOutcome, EligibilityQuestion, ELIGIBILITY_QUESTIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionnaireStatus {
    /// Waiting for an answer to the question at this index.
    Asking(usize),
    Eligible,
    Ineligible,
}

impl QuestionnaireStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuestionnaireStatus::Asking(_))
    }
}

/// Donor eligibility check: a fixed run of yes/no questions that stops at
/// the first disqualifying answer, then an appointment date picker.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    status: QuestionnaireStatus,
    answers: BTreeMap<&'static str, Answer>,
    appointment_date: Option<NaiveDate>,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self {
            status: QuestionnaireStatus::Asking(0),
            answers: BTreeMap::new(),
            appointment_date: None,
        }
    }

    pub fn status(&self) -> QuestionnaireStatus {
        self.status
    }

    pub fn current_question(&self) -> Option<&'static EligibilityQuestion> {
        match self.status {
            QuestionnaireStatus::Asking(i) => ELIGIBILITY_QUESTIONS.get(i),
            _ => None,
        }
    }

    /// `(question number, total, percent)` for the progress bar.
    pub fn progress(&self) -> (usize, usize, u8) {
        let total = ELIGIBILITY_QUESTIONS.len();
        let step = match self.status {
            QuestionnaireStatus::Asking(i) => i + 1,
            QuestionnaireStatus::Eligible => total,
            QuestionnaireStatus::Ineligible => self.answers.len(),
        };
        let percent = (step * 100 / total) as u8;
        (step, total, percent)
    }

    pub fn answers(&self) -> &BTreeMap<&'static str, Answer> {
        &self.answers
    }

    pub fn appointment_date(&self) -> Option<NaiveDate> {
        self.appointment_date
    }

    pub fn answer(&mut self, answer: Answer) -> Result<QuestionnaireStatus, FlowError> {
        let QuestionnaireStatus::Asking(index) = self.status else {
            return Err(FlowError::QuestionnaireFinished);
        };
        let question = &ELIGIBILITY_QUESTIONS[index];
        self.answers.insert(question.id, answer);

        self.status = if question.disqualifies(answer) {
            QuestionnaireStatus::Ineligible
        } else if index + 1 < ELIGIBILITY_QUESTIONS.len() {
            QuestionnaireStatus::Asking(index + 1)
        } else {
            QuestionnaireStatus::Eligible
        };

        tracing::debug!(question = question.id, answer = ?answer, status = ?self.status, "eligibility answer");
        Ok(self.status)
    }

    /// Steps back to the previous question. Only possible mid-questionnaire.
    pub fn back(&mut self) -> Result<QuestionnaireStatus, FlowError> {
        match self.status {
            QuestionnaireStatus::Asking(0) => Err(FlowError::NoPreviousQuestion),
            QuestionnaireStatus::Asking(i) => {
                self.status = QuestionnaireStatus::Asking(i - 1);
                Ok(self.status)
            }
            _ => Err(FlowError::QuestionnaireFinished),
        }
    }

    /// Picks the appointment date, checked against `today` as of the call.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), FlowError> {
        match self.status {
            QuestionnaireStatus::Eligible => {}
            QuestionnaireStatus::Asking(_) => return Err(FlowError::QuestionnaireInProgress),
            QuestionnaireStatus::Ineligible => return Err(FlowError::QuestionnaireFinished),
        }
        check_appointment_date(date, today)?;
        self.appointment_date = Some(date);
        Ok(())
    }

    /// The outcome to hand back to the conversation. An eligible donor must
    /// have picked a date that is still valid on `today`.
    pub fn finish(&self, today: NaiveDate) -> Result<EligibilityOutcome, FlowError> {
        match self.status {
            QuestionnaireStatus::Asking(_) => Err(FlowError::QuestionnaireInProgress),
            QuestionnaireStatus::Ineligible => Ok(EligibilityOutcome {
                eligible: false,
                appointment_date: None,
            }),
            QuestionnaireStatus::Eligible => match self.appointment_date {
                Some(date) => {
                    check_appointment_date(date, today)?;
                    Ok(EligibilityOutcome {
                        eligible: true,
                        appointment_date: Some(date),
                    })
                }
                None => Err(FlowError::AppointmentRequired),
            },
        }
    }
}

impl Default for Questionnaire {
    fn default() -> Self {
        Self::new()
    }
}

pub fn check_appointment_date(date: NaiveDate, today: NaiveDate) -> Result<(), DateError> {
    if date < today {
        return Err(DateError::Past(date));
    }
    if date.weekday() == Weekday::Sun {
        return Err(DateError::Sunday);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-10-14 is a Wednesday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn passing_answers() -> [Answer; 7] {
        use Answer::{No, Yes};
        [Yes, Yes, Yes, No, No, No, No]
    }

    #[test]
    fn test_first_answer_no_short_circuits() {
        let mut q = Questionnaire::new();
        let status = q.answer(Answer::No).unwrap();

        assert_eq!(status, QuestionnaireStatus::Ineligible);
        assert_eq!(q.answers().len(), 1);
        assert!(q.current_question().is_none());
        assert!(matches!(q.answer(Answer::Yes), Err(FlowError::QuestionnaireFinished)));
        assert_eq!(
            q.finish(today()).unwrap(),
            EligibilityOutcome {
                eligible: false,
                appointment_date: None
            }
        );
    }

    #[test]
    fn test_yes_disqualifies_later_questions() {
        let mut q = Questionnaire::new();
        for _ in 0..3 {
            q.answer(Answer::Yes).unwrap();
        }
        assert_eq!(q.current_question().map(|q| q.id), Some("illness"));
        assert_eq!(q.answer(Answer::Yes).unwrap(), QuestionnaireStatus::Ineligible);
        assert_eq!(q.answers().len(), 4);
    }

    #[test]
    fn test_full_pass_then_date_selection() {
        let mut q = Questionnaire::new();
        let statuses: Vec<QuestionnaireStatus> = passing_answers()
            .into_iter()
            .map(|a| q.answer(a).unwrap())
            .collect();
        assert_eq!(statuses.len(), 7);
        assert_eq!(statuses[6], QuestionnaireStatus::Eligible);
        assert!(matches!(q.finish(today()), Err(FlowError::AppointmentRequired)));

        // 2026-10-18 is a Sunday
        assert!(matches!(
            q.select_date(date(2026, 10, 18), today()),
            Err(FlowError::AppointmentDate(DateError::Sunday))
        ));
        assert!(q.appointment_date().is_none());

        let tomorrow = date(2026, 10, 15);
        q.select_date(tomorrow, today()).unwrap();
        assert_eq!(
            q.finish(today()).unwrap(),
            EligibilityOutcome {
                eligible: true,
                appointment_date: Some(tomorrow)
            }
        );
    }

    #[test]
    fn test_past_dates_rejected_today_accepted() {
        assert_eq!(
            check_appointment_date(date(2026, 10, 13), today()),
            Err(DateError::Past(date(2026, 10, 13)))
        );
        assert!(check_appointment_date(today(), today()).is_ok());
        assert!(check_appointment_date(date(2026, 10, 17), today()).is_ok());
    }

    #[test]
    fn test_picked_date_rechecked_on_finish() {
        let mut q = Questionnaire::new();
        for a in passing_answers() {
            q.answer(a).unwrap();
        }
        q.select_date(today(), today()).unwrap();

        let next_day = date(2026, 10, 15);
        assert_eq!(
            q.finish(next_day),
            Err(FlowError::AppointmentDate(DateError::Past(today())))
        );
        assert!(matches!(
            q.select_date(today(), next_day),
            Err(FlowError::AppointmentDate(DateError::Past(_)))
        ));
    }

    #[test]
    fn test_back_navigation_mid_questionnaire() {
        let mut q = Questionnaire::new();
        assert!(matches!(q.back(), Err(FlowError::NoPreviousQuestion)));

        q.answer(Answer::Yes).unwrap();
        q.answer(Answer::Yes).unwrap();
        assert_eq!(q.back().unwrap(), QuestionnaireStatus::Asking(1));
        assert_eq!(q.current_question().map(|q| q.id), Some("weight"));

        // Re-answering replaces the earlier entry.
        q.answer(Answer::Yes).unwrap();
        assert_eq!(q.answers().len(), 2);
        assert_eq!(q.status(), QuestionnaireStatus::Asking(2));
    }

    #[test]
    fn test_no_back_after_terminal_state() {
        let mut q = Questionnaire::new();
        q.answer(Answer::Yes).unwrap();
        q.answer(Answer::No).unwrap();
        assert!(matches!(q.back(), Err(FlowError::QuestionnaireFinished)));
    }

    #[test]
    fn test_date_picker_requires_eligibility() {
        let mut q = Questionnaire::new();
        assert!(matches!(
            q.select_date(date(2026, 10, 15), today()),
            Err(FlowError::QuestionnaireInProgress)
        ));
        q.answer(Answer::No).unwrap();
        assert!(matches!(
            q.select_date(date(2026, 10, 15), today()),
            Err(FlowError::QuestionnaireFinished)
        ));
    }

    #[test]
    fn test_progress() {
        let mut q = Questionnaire::new();
        assert_eq!(q.progress(), (1, 7, 14));
        q.answer(Answer::Yes).unwrap();
        assert_eq!(q.progress(), (2, 7, 28));
        for a in &passing_answers()[1..] {
            q.answer(*a).unwrap();
        }
        assert_eq!(q.progress(), (7, 7, 100));
    }
}
