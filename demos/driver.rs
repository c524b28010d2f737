extern crate linalg_interp;

use linalg_interp::{build, Method, Relaxation};
use nalgebra::{DMatrix, DVector};

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let xd = [1.0, 2.0, 3.0, 4.0];
    let yd = [1.0, 4.0, 5.0, 7.0];

    for order in 1..=3 {
        let spline = build(&xd, &yd, order).unwrap();

        let number_of_steps = 30;
        let step = (xd[3] - xd[0]) / number_of_steps as f64;

        println!("order {} ({})", order, spline.order());
        println!("x;y");
        for i in 0..=number_of_steps {
            let x = (xd[0] + step * i as f64).min(xd[3]);
            println!("{:.2};{:.4}", x, spline.interpolate(x).unwrap());
        }
    }

    let a = DMatrix::from_row_slice(4, 4, &[
        4.0, -1.0, 0.0, 0.0,
        -1.0, 4.0, -1.0, 0.0,
        0.0, -1.0, 6.0, -1.0,
        0.0, 0.0, -1.0, 3.0,
    ]);
    let b = DVector::from_vec(vec![15.0, 10.0, 10.0, 10.0]);

    for method in [Method::GaussSeidel, Method::Jacobi] {
        let solution = Relaxation::new(method).solve(&a, &b, None).unwrap();
        println!("{}: {} sweeps, x = {:.6}", method, solution.sweeps, solution.x.transpose());
    }

    let inverse = Relaxation::default().inverse(&a).unwrap();
    println!("A^-1 ={:.6}", inverse);
    println!("|A·A^-1 - I| = {:.3e}", (&a * &inverse - DMatrix::<f64>::identity(4, 4)).norm());
}
