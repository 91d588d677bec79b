use mkbc::mkbc::command::Command;
use mkbc::mkbc::errors::ExecutionError;
use mkbc::mkbc::script::ProcessRunner;
use std::cell::RefCell;
use std::collections::HashMap;

// A process runner that records the commands it is asked to run instead of
// running them
//
// Commands listed in `exit_codes` "exit" with the given code; everything else
// succeeds.
#[derive(Default)]
pub struct RecordingRunner {
    pub exit_codes : HashMap<String, i32>,
    pub ran : RefCell<Vec<String>>
}

impl RecordingRunner {
    #[allow(dead_code)] // used in some test crates (test_execute), but not others
    pub fn failing(cmds : &[(&str, i32)]) -> RecordingRunner {
        RecordingRunner { exit_codes : cmds.iter().map(|(c, ec)| (c.to_string(), *ec)).collect(),
                          ran : RefCell::new(Vec::new()) }
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, cmd : &Command) -> Result<i32, ExecutionError> {
        self.ran.borrow_mut().push(cmd.text().to_owned());
        Ok(*self.exit_codes.get(cmd.text()).unwrap_or(&0))
    }
}

// The text of each command, for compact assertions
#[allow(dead_code)]
pub fn texts(cmds : &[Command]) -> Vec<&str> {
    cmds.iter().map(|c| c.text()).collect()
}
