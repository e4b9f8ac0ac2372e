use state_machines::state_machine;

state_machine! {
    name: SeedRunMachine,
    state: SeedRunState,
    initial: Idle,
    states: [Idle, Confirming, Seeding, Reporting, Done, Aborted],
    events {
        request_confirmation { transition: { from: Idle, to: Confirming } }
        begin {
            transition: { from: Idle, to: Seeding }
            transition: { from: Confirming, to: Seeding }
        }
        report { transition: { from: Seeding, to: Reporting } }
        finish { transition: { from: Reporting, to: Done } }
        abort {
            transition: { from: Idle, to: Aborted }
            transition: { from: Confirming, to: Aborted }
            transition: { from: Seeding, to: Aborted }
        }
    }
}

pub fn idle() -> SeedRunMachine<(), Idle> {
    SeedRunMachine::new(())
}
