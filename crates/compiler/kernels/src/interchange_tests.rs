use super::*;
use lumen_compiler_ir::testing::{add, i32_array, i32_t, unique_i32_array, TestNames};
use lumen_compiler_ir::{BasicOp, Certificates, Scope};

fn width() -> SubExp {
    SubExp::i32(3)
}

/// `loop (acc = init) for j < 10: let acc' = acc + 1 in acc'` plus `extra` statements
fn counting_loop(t: &mut TestNames, init: SubExp, extra: Vec<Stm>) -> SeqLoop {
    let acc = t.name("acc");
    let acc2 = t.name("acc2");
    let j = t.name("j");
    let r = t.name("r");
    let mut stms = extra;
    stms.push(add(acc2.clone(), SubExp::var(&acc), SubExp::i32(1)));
    SeqLoop {
        pattern: Pattern::single(r, i32_t()),
        ret: vec![acc.clone()],
        merge: vec![(Param::new(acc, i32_t()), init)],
        form: LoopForm::For {
            index: j,
            bound: SubExp::i32(10),
        },
        body: Body::new(stms, vec![SubExp::var(&acc2)]),
    }
}

fn level(t: &mut TestNames, pairs: Vec<(Param, VName)>) -> LoopNesting {
    let rs = t.name("rs");
    let i = t.name("i");
    LoopNesting {
        pattern: Pattern::single(rs, i32_array([width()])),
        cs: Certificates::empty(),
        width: width(),
        index: i,
        params_and_arrays: pairs,
    }
}

fn count_copies(stms: &[Stm]) -> usize {
    stms.iter()
        .filter(|s| matches!(s.exp, Exp::BasicOp(BasicOp::Copy(_))))
        .count()
}

fn loop_body(stm: &Stm) -> &Body {
    match &stm.exp {
        Exp::DoLoop { body, .. } => body,
        _ => panic!("expected a loop"),
    }
}

fn map_of(body: &Body) -> (&Lambda, &[VName]) {
    match body.stms.last().map(|s| &s.exp) {
        Some(Exp::Map { lambda, arrays, .. }) => (lambda, arrays.as_slice()),
        _ => panic!("expected the loop body to end in a map"),
    }
}

#[test]
fn test_scalar_merge_is_replicated() {
    let mut t = TestNames::new();
    let seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![]);
    let nest = KernelNest::single(level(&mut t, vec![]));
    let rs = nest.outermost().pattern.clone();

    let (names, scope) = t.parts();
    let stms = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop)
        .unwrap()
        .unwrap();

    assert_eq!(stms.len(), 2);
    let Exp::BasicOp(BasicOp::Replicate { count, value }) = &stms[0].exp else {
        panic!("expected a replicate");
    };
    assert_eq!(count, &width());
    assert_eq!(value, &SubExp::i32(0));

    let interchanged = SeqLoop::from_stm(stms[1].clone()).unwrap();
    assert_eq!(interchanged.pattern, rs);
    assert_eq!(interchanged.ret, vec![interchanged.merge[0].0.name.clone()]);
    assert_eq!(interchanged.merge[0].0.ty, i32_array([width()]));
    assert_eq!(
        interchanged.merge[0].1,
        SubExp::var(stms[0].pattern.names().next().unwrap())
    );
}

#[test]
fn test_init_from_level_param_reuses_its_array() {
    let mut t = TestNames::new();
    let xs = t.typed("xs", i32_array([width()]));
    let x = t.param("x", i32_t());
    let seq_loop = counting_loop(&mut t, SubExp::var(&x.name), vec![]);
    let nest = KernelNest::single(level(&mut t, vec![(x, xs.clone())]));

    let (names, scope) = t.parts();
    let stms = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop)
        .unwrap()
        .unwrap();

    assert_eq!(stms.len(), 1);
    let interchanged = SeqLoop::from_stm(stms[0].clone()).unwrap();
    assert_eq!(interchanged.merge[0].1, SubExp::var(&xs));
    // `x` only seeds the loop; the body never reads it.
    let (lambda, arrays) = map_of(loop_body(&stms[0]));
    assert_eq!(lambda.params.len(), 1);
    assert_eq!(arrays, &[interchanged.merge[0].0.name.clone()]);
}

#[test]
fn test_unique_input_read_by_body_is_copied() {
    let mut t = TestNames::new();
    let row = unique_i32_array([SubExp::i32(4)]);
    let xss = t.typed("xss", unique_i32_array([width(), SubExp::i32(4)]));
    let yss = t.typed("yss", unique_i32_array([width(), SubExp::i32(4)]));
    let x = t.param("x", row.clone());
    let y = t.param("y", row.clone());
    let x2 = t.name("x2");
    let update = Stm::new(
        Pattern::single(x2, row),
        Exp::Update {
            cs: Certificates::empty(),
            src: x.name.clone(),
            indices: vec![SubExp::i32(0)],
            value: SubExp::i32(1),
        },
    );
    let seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![update]);
    let nest = KernelNest::single(level(
        &mut t,
        vec![(x.clone(), xss.clone()), (y, yss.clone())],
    ));

    let (names, scope) = t.parts();
    let stms = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop)
        .unwrap()
        .unwrap();
    let body = loop_body(stms.last().unwrap());

    assert_eq!(count_copies(&body.stms), 1);
    let Exp::BasicOp(BasicOp::Copy(src)) = &body.stms[0].exp else {
        panic!("expected the copy first");
    };
    assert_eq!(src, &xss);

    let copy_name = body.stms[0].pattern.names().next().unwrap();
    let (lambda, arrays) = map_of(body);
    assert_eq!(lambda.params[0], x);
    assert_eq!(&arrays[0], copy_name);
    // `y` is never read, so it is neither copied nor passed.
    assert!(!arrays.contains(&yss));
    assert_eq!(lambda.params.len(), 2);
}

#[test]
fn test_copies_can_be_disabled() {
    let mut t = TestNames::new();
    let row = unique_i32_array([SubExp::i32(4)]);
    let xss = t.typed("xss", unique_i32_array([width(), SubExp::i32(4)]));
    let x = t.param("x", row.clone());
    let x2 = t.name("x2");
    let update = Stm::new(
        Pattern::single(x2, row),
        Exp::Update {
            cs: Certificates::empty(),
            src: x.name.clone(),
            indices: vec![SubExp::i32(0)],
            value: SubExp::i32(1),
        },
    );
    let seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![update]);
    let nest = KernelNest::single(level(&mut t, vec![(x, xss.clone())]));
    let config = DistributionConfig {
        copy_consumed_inputs: false,
        ..DistributionConfig::default()
    };

    let (names, scope) = t.parts();
    let stms = interchange_loops(names, scope, &config, &nest, seq_loop)
        .unwrap()
        .unwrap();
    let body = loop_body(stms.last().unwrap());
    assert_eq!(count_copies(&body.stms), 0);
    assert_eq!(map_of(body).1[0], xss);
}

#[test]
fn test_two_levels_add_two_dimensions() {
    let mut t = TestNames::new();
    let seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![]);
    let inner = level(&mut t, vec![]);
    let mut outer = level(&mut t, vec![]);
    outer.width = SubExp::i32(2);
    outer.pattern = Pattern::single(t.name("rss"), i32_array([SubExp::i32(2), width()]));
    let nest = KernelNest::new(outer.clone(), vec![inner]);

    let (names, scope) = t.parts();
    let stms = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop)
        .unwrap()
        .unwrap();

    // One replicate per level, innermost first, then the loop.
    assert_eq!(stms.len(), 3);
    let interchanged = SeqLoop::from_stm(stms[2].clone()).unwrap();
    assert_eq!(interchanged.pattern, outer.pattern);
    assert_eq!(interchanged.ret.len(), 1);
    assert_eq!(interchanged.merge[0].0.ty, i32_array([SubExp::i32(2), width()]));
}

#[test]
fn test_while_loop_is_not_interchanged() {
    let mut t = TestNames::new();
    let mut seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![]);
    seq_loop.form = LoopForm::While {
        cond: t.name("go"),
    };
    let nest = KernelNest::single(level(&mut t, vec![]));
    let (names, scope) = t.parts();
    let res = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop);
    assert_eq!(res, Ok(None));
}

#[test]
fn test_bound_depending_on_map_is_not_interchanged() {
    let mut t = TestNames::new();
    let n = t.param("n", i32_t());
    let ns = t.name("ns");
    let mut seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![]);
    if let LoopForm::For { bound, .. } = &mut seq_loop.form {
        *bound = SubExp::var(&n.name);
    }
    let nest = KernelNest::single(level(&mut t, vec![(n, ns)]));
    let (names, scope) = t.parts();
    let res = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop);
    assert_eq!(res, Ok(None));
}

#[test]
fn test_copy_of_array_unknown_to_environment_takes_level_type() {
    let mut t = TestNames::new();
    let row = unique_i32_array([SubExp::i32(4)]);
    // Created by the kernel nest builder, so absent from the outer environment.
    let vs_r = t.name("vs_r");
    let v = t.param("v", row.clone());
    let v2 = t.name("v2");
    let update = Stm::new(
        Pattern::single(v2, row),
        Exp::Update {
            cs: Certificates::empty(),
            src: v.name.clone(),
            indices: vec![SubExp::i32(0)],
            value: SubExp::i32(1),
        },
    );
    let seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![update]);
    let nest = KernelNest::single(level(&mut t, vec![(v, vs_r.clone())]));
    let mut names = NameSource::new(1000);
    let stms = interchange_loops(
        &mut names,
        &Scope::new(),
        &DistributionConfig::default(),
        &nest,
        seq_loop,
    )
    .unwrap()
    .unwrap();

    let body = loop_body(stms.last().unwrap());
    assert_eq!(count_copies(&body.stms), 1);
    assert_eq!(body.stms[0].exp, Exp::BasicOp(BasicOp::Copy(vs_r)));
    assert_eq!(
        body.stms[0].pattern.types().next(),
        Some(&unique_i32_array([width(), SubExp::i32(4)]))
    );
}

#[test]
fn test_returned_name_outside_merge_is_an_error() {
    let mut t = TestNames::new();
    let mut seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![]);
    let stray = t.name("stray");
    seq_loop.ret = vec![stray.clone()];
    let nest = KernelNest::single(level(&mut t, vec![]));
    let (names, scope) = t.parts();
    let err = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop)
        .unwrap_err();
    assert_eq!(err, DistributeError::UnboundName { name: stray });
}

#[test]
fn test_level_pattern_must_match_returned_values() {
    let mut t = TestNames::new();
    let seq_loop = counting_loop(&mut t, SubExp::i32(0), vec![]);
    let mut outer = level(&mut t, vec![]);
    outer.pattern.extend([PatElem::new(t.name("extra"), i32_array([width()]))]);
    let nest = KernelNest::single(outer);
    let (names, scope) = t.parts();
    let err = interchange_loops(names, scope, &DistributionConfig::default(), &nest, seq_loop)
        .unwrap_err();
    assert_eq!(
        err,
        DistributeError::ArityMismatch {
            what: "interchanged loop",
            pattern: 2,
            result: 1,
        }
    );
}

#[test]
fn test_aligned_with_reorders_results() {
    let mut t = TestNames::new();
    let a = t.name("a");
    let b = t.name("b");
    let p = t.name("p");
    let q = t.name("q");
    let seq_loop = SeqLoop {
        pattern: Pattern::new(vec![
            PatElem::new(a.clone(), i32_t()),
            PatElem::new(b.clone(), i32_t()),
        ]),
        ret: vec![p.clone(), q.clone()],
        merge: vec![
            (Param::new(p.clone(), i32_t()), SubExp::i32(0)),
            (Param::new(q.clone(), i32_t()), SubExp::i32(0)),
        ],
        form: LoopForm::For {
            index: t.name("j"),
            bound: SubExp::i32(4),
        },
        body: Body::new(vec![], vec![SubExp::var(&p), SubExp::var(&q)]),
    };

    let aligned = seq_loop
        .clone()
        .aligned_with(&[SubExp::var(&b), SubExp::var(&a)])
        .unwrap();
    assert_eq!(aligned.pattern.names().collect::<Vec<_>>(), vec![&b, &a]);
    assert_eq!(aligned.ret, vec![q, p]);
    assert!(seq_loop.aligned_with(&[SubExp::i32(1)]).is_none());
}
