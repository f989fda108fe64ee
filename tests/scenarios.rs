use anyhow::Result;
use assert_matches::assert_matches;
use rumpsteak_protocol::choreography::{
    project, Arg, ErrorKind, GProtocol, GType, InlineError, LType, MessageSig, ProtocolName,
    ProtocolSet, ReachabilityError, RecVar, Role, RoleEnablingMode, WellFormednessError,
};
use rumpsteak_protocol::fsm::{Dot, EAction, EGraph, ToEGraph};
use rumpsteak_protocol::{Job, JobConfig, JobError, ProtocolArtifacts, UnusedRolePolicy};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn msg(op: &str) -> MessageSig {
    MessageSig::label(op)
}

fn call(proto: &str, roles: [&str; 2]) -> GType {
    GType::call(proto, roles, Vec::<Arg>::new())
}

fn run(protocol: GProtocol, config: JobConfig) -> Result<ProtocolArtifacts, JobError> {
    init_tracing();
    let name = protocol.name.clone();
    let protocols: ProtocolSet = [protocol].into_iter().collect();
    Job::new(protocols, config).run_protocol(&name)
}

fn graph<'a>(artifacts: &'a ProtocolArtifacts, role: &str) -> &'a EGraph {
    artifacts.graph(&Role::new(role)).unwrap()
}

fn receive(peer: &str, op: &str) -> EAction {
    EAction::Receive {
        peer: Role::new(peer),
        msg: msg(op).into(),
    }
}

#[test]
fn single_transfer() -> Result<()> {
    let body = GType::transfer("A", msg("M1"), ["B"]);
    let artifacts = run(GProtocol::new("P", ["A", "B"], body), JobConfig::default())?;

    assert_eq!(
        artifacts.projection(&Role::new("B")),
        Some(&LType::receive("A", msg("M1")))
    );

    let b = graph(&artifacts, "B");
    let terminal = b.terminal().unwrap();
    assert_eq!(b.size(), (2, 1));
    assert_eq!(b.edges_from(b.entry()), vec![(&receive("A", "M1"), terminal)]);
    Ok(())
}

#[test]
fn branching_receive() -> Result<()> {
    let body = GType::choice(
        "A",
        [
            GType::transfer("A", msg("M1"), ["B"]),
            GType::transfer("A", msg("M2"), ["B"]),
        ],
    );
    let artifacts = run(GProtocol::new("P", ["A", "B"], body), JobConfig::default())?;

    let b = graph(&artifacts, "B");
    let terminal = b.terminal().unwrap();
    assert_eq!(b.size(), (2, 2));
    assert_eq!(
        b.edges_from(b.entry()),
        vec![
            (&receive("A", "M1"), terminal),
            (&receive("A", "M2"), terminal),
        ]
    );

    let a = graph(&artifacts, "A");
    assert!(a.edges_from(a.entry()).iter().all(|(action, _)| action.is_send()));
    Ok(())
}

#[test]
fn inconsistent_external_choice() {
    let body = GType::choice(
        "A",
        [
            GType::transfer("A", msg("M1"), ["B"]),
            GType::transfer("C", msg("M2"), ["B"]),
        ],
    );
    let error = run(GProtocol::new("P", ["A", "B", "C"], body), JobConfig::default()).unwrap_err();

    assert_eq!(error.kind, ErrorKind::InconsistentExternalChoice);
    assert_eq!(error.roles.first(), Some(&Role::new("B")));
    assert_matches!(
        error.downcast_ref::<WellFormednessError>(),
        Some(WellFormednessError::InconsistentExternalChoice { receiver, senders })
            if receiver == &Role::new("B") && senders == &[Role::new("A"), Role::new("C")]
    );
}

#[test]
fn guarded_loop_is_self_loop() -> Result<()> {
    let body = GType::rec(
        "X",
        GType::seq([GType::transfer("A", msg("M1"), ["B"]), GType::cont("X")]),
    );
    let artifacts = run(GProtocol::new("P", ["A", "B"], body.clone()), JobConfig::default())?;

    let direct = project(&body, &Role::new("B"))?.to_egraph()?;
    assert_eq!(direct.size(), (1, 1));

    let b = graph(&artifacts, "B");
    let entry = b.entry();
    assert_eq!(b.size(), (1, 1));
    assert_eq!(b.terminal(), None);
    assert_eq!(b.edges_from(entry), vec![(&receive("A", "M1"), entry)]);
    assert!(b.labels(entry).contains(&RecVar::new("X")));
    Ok(())
}

#[test]
fn choice_unguarded_continue() -> Result<()> {
    let body = GType::rec(
        "X",
        GType::choice(
            "A",
            [GType::cont("X"), GType::transfer("A", msg("M1"), ["B"])],
        ),
    );
    let artifacts = run(GProtocol::new("P", ["A", "B"], body), JobConfig::default())?;

    for (_, graph) in &artifacts.graphs {
        let (states, _) = graph.size();
        assert_eq!(graph.states().len(), states);
    }

    let b = graph(&artifacts, "B");
    let terminal = b.terminal().unwrap();
    assert_eq!(b.size(), (2, 1));
    assert_eq!(b.edges_from(b.entry()), vec![(&receive("A", "M1"), terminal)]);
    Ok(())
}

#[test]
fn recursive_subprotocol() -> Result<()> {
    init_tracing();
    let main = GProtocol::new("Main", ["A", "B"], call("Loop", ["A", "B"]));
    let looping = GProtocol::new(
        "Loop",
        ["C", "D"],
        GType::seq([
            GType::transfer("C", msg("Ping"), ["D"]),
            call("Loop", ["C", "D"]),
        ]),
    )
    .auxiliary();
    let protocols: ProtocolSet = [main, looping].into_iter().collect();

    let artifacts = Job::new(protocols, JobConfig::default()).run()?;
    assert_eq!(artifacts.len(), 1);

    let main = &artifacts[&ProtocolName::new("Main")];
    let b = graph(main, "B");
    assert_eq!(b.size(), (1, 1));
    assert_eq!(b.edges_from(b.entry()), vec![(&receive("A", "Ping"), b.entry())]);
    Ok(())
}

#[test]
fn unproductive_subprotocol_cycle() {
    let main = GProtocol::new("Main", ["A", "B"], call("Idle", ["A", "B"]));
    let idle = GProtocol::new("Idle", ["A", "B"], call("Idle", ["A", "B"])).auxiliary();
    let protocols: ProtocolSet = [main, idle].into_iter().collect();

    let error = Job::new(protocols, JobConfig::default()).run().unwrap_err();
    assert_eq!(error.kind, ErrorKind::NonTerminatingInlining);
    assert_eq!(error.protocol, ProtocolName::new("Main"));
}

#[test]
fn unknown_subprotocol() {
    let body = call("Missing", ["A", "B"]);
    let error = run(GProtocol::new("P", ["A", "B"], body), JobConfig::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedSubprotocol);
    assert_matches!(
        error.downcast_ref::<InlineError>(),
        Some(InlineError::UnknownProtocol { proto }) if proto == &ProtocolName::new("Missing")
    );
}

#[test]
fn unused_role_policy() -> Result<()> {
    let protocol = GProtocol::new("P", ["A", "B", "C"], GType::transfer("A", msg("M1"), ["B"]));

    let error = run(protocol.clone(), JobConfig::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnusedRole);
    assert_eq!(error.roles, vec![Role::new("C")]);

    let config = JobConfig::new().unused_roles(UnusedRolePolicy::Warn);
    let artifacts = run(protocol, config)?;
    let c = graph(&artifacts, "C");
    assert_eq!(c.size(), (1, 0));
    assert_eq!(c.terminal(), Some(c.entry()));
    Ok(())
}

#[test]
fn role_enabling_modes() -> Result<()> {
    let body = GType::seq([
        GType::transfer("A", msg("M1"), ["B"]),
        GType::transfer("C", msg("M2"), ["A"]),
    ]);
    let protocol = GProtocol::new("P", ["A", "B", "C"], body);

    let error = run(protocol.clone(), JobConfig::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::RoleNotEnabled);
    assert_eq!(error.roles, vec![Role::new("C")]);

    let config = JobConfig::new().role_enabling(RoleEnablingMode::AllDeclared);
    run(protocol, config)?;
    Ok(())
}

#[test]
fn vacuous_recursion() -> Result<()> {
    let body = GType::rec("X", GType::transfer("A", msg("M1"), ["B"]));
    let protocol = GProtocol::new("P", ["A", "B"], body);

    let error = run(protocol.clone(), JobConfig::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::VacuousRecursion);
    assert_matches!(
        error.downcast_ref::<ReachabilityError>(),
        Some(ReachabilityError::UnusedRecursion { var }) if var == &RecVar::new("X")
    );

    // With the check disabled the recursion is projected away
    let artifacts = run(protocol, JobConfig::new().check_reachability(false))?;
    assert_eq!(graph(&artifacts, "B").size(), (2, 1));
    Ok(())
}

#[test]
fn dead_code_after_endless_loop() {
    let body = GType::seq([
        GType::rec(
            "X",
            GType::seq([GType::transfer("A", msg("M1"), ["B"]), GType::cont("X")]),
        ),
        GType::transfer("A", msg("M2"), ["B"]),
    ]);
    let error = run(GProtocol::new("P", ["A", "B"], body), JobConfig::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnreachableBranch);
}

#[test]
fn shadowed_local_block() {
    let body = GType::choice(
        "A",
        [
            GType::seq([
                GType::transfer("A", msg("M1"), ["B"]),
                GType::transfer("A", msg("M2"), ["B"]),
            ]),
            GType::seq([
                GType::transfer("A", msg("M1"), ["B"]),
                GType::transfer("A", msg("M3"), ["C"]),
            ]),
        ],
    );
    let error = run(GProtocol::new("P", ["A", "B", "C"], body), JobConfig::default()).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnreachableBranch);
    assert!(error.roles.contains(&Role::new("B")));
    assert_matches!(
        error.downcast_ref::<ReachabilityError>(),
        Some(ReachabilityError::ShadowedBlock { .. })
    );
}

#[test]
fn run_each_continues_past_failures() {
    init_tracing();
    let good = GProtocol::new("Good", ["A", "B"], GType::transfer("A", msg("M1"), ["B"]));
    let bad = GProtocol::new("Bad", ["A", "B"], call("Missing", ["A", "B"]));
    let protocols: ProtocolSet = [good, bad].into_iter().collect();
    let job = Job::new(protocols, JobConfig::default());

    let results = job.run_each();
    assert_eq!(results.len(), 2);
    assert!(results[&ProtocolName::new("Good")].is_ok());
    assert_matches!(
        &results[&ProtocolName::new("Bad")],
        Err(error) if error.kind == ErrorKind::UnresolvedSubprotocol
    );

    let error = job.run().unwrap_err();
    assert_eq!(error.protocol, ProtocolName::new("Bad"));
}

#[test]
fn dot_export() -> Result<()> {
    let body = GType::transfer("A", msg("M1"), ["B", "C"]);
    let artifacts = run(GProtocol::new("P", ["A", "B", "C"], body), JobConfig::default())?;

    let role = Role::new("A");
    let dot = Dot::new(&role, graph(&artifacts, "A")).to_string();
    assert!(dot.starts_with("digraph \"A\" {"));
    assert!(dot.contains("[label=\"B!M1()\"]"));
    assert!(dot.contains("[label=\"C!M1()\"]"));
    assert!(dot.contains("[shape=doublecircle]"));
    Ok(())
}

#[test]
fn role_outside_inner_loop() -> Result<()> {
    let body = GType::rec(
        "Y",
        GType::seq([
            GType::transfer("A", msg("M"), ["B"]),
            GType::rec(
                "X",
                GType::choice(
                    "A",
                    [
                        GType::seq([GType::transfer("A", msg("M1"), ["C"]), GType::cont("X")]),
                        GType::seq([GType::transfer("A", msg("M2"), ["C"]), GType::cont("Y")]),
                    ],
                ),
            ),
        ]),
    );
    let artifacts = run(GProtocol::new("P", ["A", "B", "C"], body), JobConfig::default())?;

    let b = graph(&artifacts, "B");
    let entry = b.entry();
    assert_eq!(b.size(), (1, 1));
    assert_eq!(b.edges_from(entry), vec![(&receive("A", "M"), entry)]);

    let c = graph(&artifacts, "C");
    let entry = c.entry();
    assert_eq!(
        c.edges_from(entry),
        vec![(&receive("A", "M1"), entry), (&receive("A", "M2"), entry)]
    );
    Ok(())
}
