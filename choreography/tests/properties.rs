use proptest::prelude::*;
use rumpsteak_choreography::{
    check_reachability, check_role_enabling, inline, project_all, unfold_all_once, Enabling,
    GProtocol, GType, MessageSig, ProtocolName, ProtocolSet, ReachabilityError, RecVar, Role, RoleList,
    SessionType, DEFAULT_MAX_INLINING_DEPTH,
};
use std::collections::BTreeSet;

const ROLES: [&str; 3] = ["A", "B", "C"];
const LABELS: [&str; 2] = ["M1", "M2"];
const NAMES: [&str; 2] = ["X", "Y"];

/// Shape of a global type, with continues given as binder depths so that
/// every generated type is closed
#[derive(Debug, Clone)]
enum Tree {
    Transfer { src: usize, offset: usize, label: usize },
    Seq(Vec<Tree>),
    Choice { subj: usize, blocks: Vec<Tree> },
    Rec { name: usize, body: Box<Tree>, exit: Exit },
}

/// How a recursion body loops back to the binder `depth` levels out
#[derive(Debug, Clone, Copy)]
enum Exit {
    /// `body; continue V;`
    Guarded { depth: usize },
    /// `choice at subj { continue V; } or { body }`
    Unguarded { depth: usize, subj: usize },
}

impl Tree {
    fn to_global(&self, binders: &mut Vec<RecVar>) -> GType {
        match self {
            Tree::Transfer { src, offset, label } => {
                let dst = (src + offset) % ROLES.len();
                GType::transfer(ROLES[*src], MessageSig::label(LABELS[*label]), [ROLES[dst]])
            }
            Tree::Seq(elems) => GType::seq(elems.iter().map(|elem| elem.to_global(binders))),
            Tree::Choice { subj, blocks } => GType::choice(
                ROLES[*subj],
                blocks.iter().map(|block| block.to_global(binders)),
            ),
            Tree::Rec { name, body, exit } => {
                let var = RecVar::new(NAMES[*name]);
                binders.push(var.clone());
                let body = body.to_global(binders);
                let ty = match *exit {
                    Exit::Guarded { depth } => GType::seq([body, continue_to(binders, depth)]),
                    Exit::Unguarded { depth, subj } => {
                        GType::choice(ROLES[subj], [continue_to(binders, depth), body])
                    }
                };
                binders.pop();
                GType::rec(var, ty)
            }
        }
    }
}

/// Continue to an enclosing binder, possibly an outer or shadowed one
fn continue_to(binders: &[RecVar], depth: usize) -> GType {
    let index = binders.len() - 1 - depth % binders.len();
    GType::cont(binders[index].clone())
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = (0..3usize, 1..3usize, 0..2usize)
        .prop_map(|(src, offset, label)| Tree::Transfer { src, offset, label });
    leaf.prop_recursive(4, 24, 3, |inner| {
        let exit = prop_oneof![
            (0..3usize).prop_map(|depth| Exit::Guarded { depth }),
            (0..3usize, 0..3usize).prop_map(|(depth, subj)| Exit::Unguarded { depth, subj }),
        ];
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..3).prop_map(Tree::Seq),
            (0..3usize, prop::collection::vec(inner.clone(), 2..3))
                .prop_map(|(subj, blocks)| Tree::Choice { subj, blocks }),
            (0..2usize, inner, exit).prop_map(|(name, body, exit)| Tree::Rec {
                name,
                body: Box::new(body),
                exit,
            }),
        ]
    })
}

/// Closed, call-free global types over three roles, with nested, outer
/// and shadowed recursion variables
fn global() -> impl Strategy<Value = GType> {
    tree().prop_map(|tree| tree.to_global(&mut Vec::new()))
}

fn roles() -> RoleList {
    ROLES.iter().map(Role::new).collect()
}

fn module(body: GType) -> (ProtocolSet, ProtocolName) {
    let protocol = GProtocol::new("P", ROLES, body);
    let name = protocol.name.clone();
    ([protocol].into_iter().collect(), name)
}

proptest! {
    #[test]
    fn projection_is_total(ty in global()) {
        let projections = project_all(&ty, &roles()).unwrap();
        prop_assert_eq!(projections.len(), ROLES.len());
        for (_, local) in &projections {
            prop_assert!(local.free_rec_vars().is_empty());
        }
    }

    #[test]
    fn projected_loops_are_never_vacuous(ty in global()) {
        prop_assume!(check_reachability(&ty).is_ok());
        for (role, local) in project_all(&ty, &roles()).unwrap() {
            if let Err(err) = check_reachability(&local) {
                prop_assert!(
                    !matches!(
                        err,
                        ReachabilityError::UnusedRecursion { .. }
                            | ReachabilityError::ActionlessRecursion { .. }
                    ),
                    "{} has a vacuous loop in {}: {}",
                    role,
                    local,
                    err
                );
            }
        }
    }

    #[test]
    fn inlining_is_idempotent(ty in global()) {
        let (protocols, name) = module(ty);
        let once = inline(&protocols, &name, DEFAULT_MAX_INLINING_DEPTH).unwrap();
        let (protocols, name) = module(once.clone());
        let twice = inline(&protocols, &name, DEFAULT_MAX_INLINING_DEPTH).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn enabling_grows_along_sequences(elems in prop::collection::vec(global(), 1..4)) {
        let mut before = Enabling::session_start();
        for elem in &elems {
            let Ok(after) = check_role_enabling(&unfold_all_once(elem), before.clone()) else {
                break;
            };
            prop_assert!(before.roles().is_subset(after.roles()));
            before = after;
        }
    }

    #[test]
    fn enabling_after_choice_is_block_intersection(
        subj in 0..3usize,
        blocks in prop::collection::vec(global(), 2..4),
    ) {
        let subj = Role::new(ROLES[subj]);
        let blocks: Vec<GType> = blocks.iter().map(unfold_all_once).collect();

        let mut posts = Vec::new();
        for block in &blocks {
            let post = check_role_enabling(block, Enabling::block(&subj));
            prop_assume!(post.is_ok());
            if let Ok(post) = post {
                posts.push(post.roles().clone());
            }
        }

        let choice = GType::choice(subj.clone(), blocks);
        let after = check_role_enabling(&choice, Enabling::block(&subj)).unwrap();

        let mut expected: BTreeSet<Role> = posts
            .iter()
            .skip(1)
            .fold(posts[0].clone(), |common, post| {
                common.intersection(post).cloned().collect()
            });
        expected.insert(subj);
        prop_assert_eq!(after.roles(), &expected);
    }

    #[test]
    fn enabling_all_roles_is_monotonic(ty in global()) {
        let unfolded = unfold_all_once(&ty);
        if let Ok(after) = check_role_enabling(&unfolded, Enabling::session_start()) {
            let all = check_role_enabling(&unfolded, Enabling::all(&roles())).unwrap();
            prop_assert!(after.roles().is_subset(all.roles()));
        }
    }
}
