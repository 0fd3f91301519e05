/// Evaluates `$body` and logs how many gates it added to `$builder`.
macro_rules! measure_gates {
    ($builder:expr, $name:expr, $body:expr) => {{
        let gates_before = $builder.num_gates();
        let result = $body;
        log::trace!(
            "{}: {} gates",
            $name,
            $builder.num_gates() - gates_before
        );
        result
    }};
}
