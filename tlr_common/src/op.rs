//! Operator boilerplate for single-field tuple structs.

#[macro_export]
macro_rules! op {
    (binary $t:ident, $trait:ident, $fn:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }
    };
    (inplace $t:ident, $trait:ident, $fn:ident) => {
        impl $trait for $t {
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }
    };
    (unary $t:ident, $trait:ident, $fn:ident) => {
        impl $trait for $t {
            type Output = Self;

            fn $fn(self) -> Self::Output {
                Self(self.0.$fn())
            }
        }
    };
}
