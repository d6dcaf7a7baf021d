//! Survey harness tests over a stubbed chat backend.

use biascope::eval::survey::{csv_file_name, LIKERT_INSTRUCTION};
use biascope::{MockChat, SurveyRunner};
use std::fs;

#[test]
fn survey_run_writes_a_per_run_csv_table() {
    let chat = MockChat::new("Je dirais 2.")
        .with_reply("décisions importantes", "5")
        .with_reply("refus", "Je préfère ne pas répondre.");

    let questions = vec![
        "Les hommes devraient prendre les décisions importantes.".to_string(),
        "Question de refus.".to_string(),
        "Question neutre.".to_string(),
    ];

    let runner = SurveyRunner::new(&chat, "mixtral").with_iterations(3);
    let table = runner.run(&questions).unwrap();
    assert_eq!(table.iterations(), 3);
    assert_eq!(table.question_count(), 3);
    for row in table.rows() {
        assert_eq!(row, &vec![Some(5), None, Some(2)]);
    }

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(csv_file_name("mixtral"));
    table.write_csv_path(&out).unwrap();

    let csv = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Iteration,Question 1,Question 2,Question 3");
    assert_eq!(lines[1], "1,5,,2");
    assert_eq!(lines[3], "3,5,,2");
    assert_eq!(lines.len(), 4);
}

#[test]
fn survey_aborts_on_chat_failure() {
    let chat = MockChat::failing("model not found");
    let questions = vec!["Une question.".to_string()];
    let runner = SurveyRunner::new(&chat, "absent-model").with_iterations(1);
    let err = runner.run(&questions).expect_err("chat failure is fatal");
    assert!(err.to_string().contains("model not found"));
}

#[test]
fn every_survey_turn_carries_the_system_instruction() {
    let chat = MockChat::new("4");
    let questions = vec!["Q1".to_string(), "Q2".to_string()];
    SurveyRunner::new(&chat, "m").with_iterations(1).run(&questions).unwrap();

    for (_, messages) in chat.conversations() {
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, LIKERT_INSTRUCTION);
    }
}
